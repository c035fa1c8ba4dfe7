// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Failure isolation: which collaborator failures surface and which degrade

use dara_node::modes::{Language, Mode};
use dara_node::orchestrator::{DetectionError, DetectionRequest, Detector, ImageInput};
use dara_node::services::AudioCache;
use std::time::{Duration, Instant};

use crate::common::{solid_image, Behavior, FakeBackend, FakeSynth, FakeTranslator};

fn green() -> ImageInput {
    ImageInput::Decoded(solid_image([20, 200, 20]))
}

#[tokio::test]
async fn test_translation_failure_returns_untranslated_text() {
    let translator = FakeTranslator::failing();
    let detector = Detector::new(FakeBackend::replying("A wet floor near the stairs"))
        .with_translator(translator.clone());

    let result = detector
        .detect(DetectionRequest::new(green(), Mode::Scene).language(Language::Indonesian))
        .await
        .unwrap();

    assert_eq!(translator.calls(), 1);
    assert_eq!(result.text, "A wet floor near the stairs");
    assert_eq!(result.language, Language::Indonesian);
    assert_eq!(result.suggestions[0], "Awas: stairs terdeteksi");
}

#[tokio::test]
async fn test_untranslated_result_is_retried_after_translator_recovers() {
    let backend = FakeBackend::replying("A door on the left");
    let translator = FakeTranslator::flaky(1);
    let detector = Detector::new(backend.clone()).with_translator(translator.clone());

    let first = detector
        .detect(DetectionRequest::new(green(), Mode::Scene).language(Language::Indonesian))
        .await
        .unwrap();
    assert_eq!(first.text, "A door on the left");
    assert_eq!(detector.cache_stats().size, 0);

    let second = detector
        .detect(DetectionRequest::new(green(), Mode::Scene).language(Language::Indonesian))
        .await
        .unwrap();
    assert_eq!(second.text, "[id] A door on the left");
    assert_eq!(translator.calls(), 2);
    assert_eq!(backend.calls(), 2);
    assert_eq!(detector.cache_stats().size, 1);

    detector
        .detect(DetectionRequest::new(green(), Mode::Scene).language(Language::Indonesian))
        .await
        .unwrap();
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_failed_synthesis_result_is_still_cached() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::replying("PUSH");
    let detector = Detector::new(backend.clone())
        .with_audio(AudioCache::new(FakeSynth::failing(), dir.path(), 16, 2));

    detector
        .detect(DetectionRequest::new(green(), Mode::Text).with_audio(true))
        .await
        .unwrap();

    assert_eq!(detector.cache_stats().size, 1);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_translatable_modes_are_translated() {
    let translator = FakeTranslator::working();
    let detector = Detector::new(FakeBackend::replying("A quiet street"))
        .with_translator(translator.clone());

    let result = detector
        .detect(DetectionRequest::new(green(), Mode::Scene).language(Language::Indonesian))
        .await
        .unwrap();

    assert_eq!(result.text, "[id] A quiet street");
    assert_eq!(result.raw_output, "A quiet street");
}

#[tokio::test]
async fn test_localized_and_english_results_skip_translation() {
    let translator = FakeTranslator::working();
    let detector = Detector::new(FakeBackend::replying("Rp 20.000"))
        .with_translator(translator.clone());

    let currency = detector
        .detect(DetectionRequest::new(green(), Mode::Currency).language(Language::Indonesian))
        .await
        .unwrap();
    assert!(currency.text.starts_with("Terdeteksi: Rp 20.000"));

    detector
        .detect(DetectionRequest::new(green(), Mode::Scene))
        .await
        .unwrap();

    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn test_failed_synthesis_leaves_audio_empty() {
    let dir = tempfile::tempdir().unwrap();
    let synth = FakeSynth::failing();
    let detector = Detector::new(FakeBackend::replying("PUSH"))
        .with_audio(AudioCache::new(synth.clone(), dir.path(), 16, 2));

    let result = detector
        .detect(DetectionRequest::new(green(), Mode::Text).with_audio(true))
        .await
        .unwrap();

    assert_eq!(synth.calls(), 1);
    assert!(result.audio.is_none());
    assert_eq!(result.text, "PUSH");
}

#[tokio::test]
async fn test_audio_requested_without_engine_is_ignored() {
    let detector = Detector::new(FakeBackend::replying("PUSH"));
    let result = detector
        .detect(DetectionRequest::new(green(), Mode::Text).with_audio(true))
        .await
        .unwrap();
    assert!(result.audio.is_none());
}

#[tokio::test]
async fn test_backend_failure_surfaces_and_is_not_cached() {
    let backend = FakeBackend::new(Behavior::Fail);
    let detector = Detector::new(backend.clone());

    for _ in 0..2 {
        let err = detector
            .detect(DetectionRequest::new(green(), Mode::Scene))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::InferenceBackend(_)));
    }

    assert_eq!(backend.calls(), 2);
    assert_eq!(detector.cache_stats().size, 0);
}

#[tokio::test]
async fn test_backend_timeout_surfaces_as_timeout() {
    let backend = FakeBackend::new(Behavior::Hang);
    let detector = Detector::new(backend.clone()).with_inference_timeout(Duration::from_millis(50));

    let started = Instant::now();
    let err = detector
        .detect(DetectionRequest::new(green(), Mode::Emotion))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5));
    match err {
        DetectionError::InferenceBackend(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(detector.cache_stats().size, 0);
}

#[tokio::test]
async fn test_malformed_structured_output_falls_back_to_raw_text() {
    let detector = Detector::new(FakeBackend::replying("{\"<OCR>\": 42}"));

    let result = detector
        .detect(DetectionRequest::new(green(), Mode::Text))
        .await
        .unwrap();

    assert_eq!(result.metadata["post_processed"], false);
    assert!(result.metadata.contains_key("error"));
    assert_eq!(result.text, "{\"<OCR>\": 42}");
    assert!(result.confidence >= 0.0 && result.confidence <= 1.0);
    assert_eq!(detector.cache_stats().size, 0);
}

#[tokio::test]
async fn test_structured_output_is_unwrapped() {
    let detector = Detector::new(FakeBackend::replying(
        "{\"<MORE_DETAILED_CAPTION>\": \"A door to the right</s>\"}",
    ));

    let result = detector
        .detect(DetectionRequest::new(green(), Mode::Scene))
        .await
        .unwrap();

    assert_eq!(result.text, "A door to the right");
    assert_eq!(result.suggestions, vec!["Door detected", "Object on the right"]);
}
