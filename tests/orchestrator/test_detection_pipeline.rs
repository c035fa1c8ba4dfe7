// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detection pipeline tests: caching, prompts, request validation and audio

use dara_node::modes::{Language, Mode};
use dara_node::orchestrator::{DetectionError, DetectionRequest, Detector, ImageInput};
use dara_node::services::AudioCache;
use std::sync::Arc;

use crate::common::{png_base64, solid_image, FakeBackend, FakeSynth};

fn red() -> ImageInput {
    ImageInput::Decoded(solid_image([220, 20, 20]))
}

#[tokio::test]
async fn test_repeat_request_served_from_cache() {
    let backend = FakeBackend::replying("A door on the left of a hallway");
    let detector = Detector::new(backend.clone());

    let first = detector
        .detect(DetectionRequest::new(red(), Mode::Scene))
        .await
        .unwrap();
    let second = detector
        .detect(DetectionRequest::new(red(), Mode::Scene))
        .await
        .unwrap();

    assert_eq!(backend.calls(), 1);
    assert_eq!(first, second);

    let stats = detector.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.size, 1);
}

#[tokio::test]
async fn test_same_pixels_in_different_encodings_share_cache_entry() {
    let backend = FakeBackend::replying("EXIT");
    let detector = Detector::new(backend.clone());
    let image = solid_image([10, 120, 200]);

    detector
        .detect(DetectionRequest::new(image.clone(), Mode::Text))
        .await
        .unwrap();
    detector
        .detect(DetectionRequest::new(
            ImageInput::Base64(png_base64(&image)),
            Mode::Text,
        ))
        .await
        .unwrap();

    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_mode_language_and_image_are_part_of_the_key() {
    let backend = FakeBackend::replying("a calm person");
    let detector = Detector::new(backend.clone());

    detector
        .detect(DetectionRequest::new(red(), Mode::Emotion))
        .await
        .unwrap();
    detector
        .detect(DetectionRequest::new(red(), Mode::Emotion).language(Language::Indonesian))
        .await
        .unwrap();
    detector
        .detect(DetectionRequest::new(red(), Mode::Scene))
        .await
        .unwrap();
    detector
        .detect(DetectionRequest::new(
            ImageInput::Decoded(solid_image([0, 0, 0])),
            Mode::Emotion,
        ))
        .await
        .unwrap();

    assert_eq!(backend.calls(), 4);
    assert_eq!(detector.cache_stats().size, 4);
}

#[tokio::test]
async fn test_each_mode_sends_its_prompt() {
    let backend = FakeBackend::replying("something");
    let detector = Detector::new(backend.clone()).with_result_cache(None);

    for mode in [Mode::Scene, Mode::Emotion, Mode::Medicine, Mode::Currency, Mode::Text] {
        detector
            .detect(DetectionRequest::new(red(), mode))
            .await
            .unwrap();
    }

    assert_eq!(
        backend.prompts(),
        vec![
            "<MORE_DETAILED_CAPTION>",
            "<CAPTION>",
            "<OCR>",
            "<OCR>",
            "<OCR>"
        ]
    );
}

#[tokio::test]
async fn test_replay_after_clear_is_identical() {
    let backend = FakeBackend::replying("Paracetamol 500 mg. Take 1 tablet twice daily. EXP 12/2026");
    let detector = Detector::new(backend.clone());

    let first = detector
        .detect(DetectionRequest::new(red(), Mode::Medicine))
        .await
        .unwrap();
    assert_eq!(detector.clear_cache(), 1);
    assert_eq!(detector.cache_stats().size, 0);

    let replay = detector
        .detect(DetectionRequest::new(red(), Mode::Medicine))
        .await
        .unwrap();

    assert_eq!(backend.calls(), 2);
    assert_eq!(first.text, replay.text);
    assert_eq!(first.metadata, replay.metadata);
    assert_eq!(first.confidence, replay.confidence);
}

#[tokio::test]
async fn test_unknown_mode_rejected_before_any_work() {
    let backend = FakeBackend::replying("unused");
    let detector = Detector::new(backend.clone());

    let err = detector
        .detect_str(red(), "colour", Language::English, false)
        .await
        .unwrap_err();

    match err {
        DetectionError::InvalidMode {
            requested,
            available,
        } => {
            assert_eq!(requested, "colour");
            assert_eq!(available, "scene, emotion, medicine, currency, text");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(backend.calls(), 0);
    assert_eq!(detector.cache_stats().misses, 0);
}

#[tokio::test]
async fn test_mode_text_is_case_insensitive() {
    let detector = Detector::new(FakeBackend::replying("EXIT"));
    let result = detector
        .detect_str(red(), " Text ", Language::English, false)
        .await
        .unwrap();
    assert_eq!(result.mode, Mode::Text);
}

#[tokio::test]
async fn test_undecodable_image_is_image_load_error() {
    let backend = FakeBackend::replying("unused");
    let detector = Detector::new(backend.clone());

    let err = detector
        .detect(DetectionRequest::new(
            ImageInput::Base64("bm90IGFuIGltYWdl".to_string()),
            Mode::Scene,
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, DetectionError::ImageLoad(_)));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_audio_attached_only_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    let synth = FakeSynth::working();
    let detector = Detector::new(FakeBackend::replying("STOP"))
        .with_audio(AudioCache::new(synth.clone(), dir.path(), 16, 2));

    let spoken = detector
        .detect(DetectionRequest::new(red(), Mode::Text).with_audio(true))
        .await
        .unwrap();
    let audio = spoken.audio.clone().unwrap();
    assert!(audio.exists());
    assert!(audio.starts_with(dir.path()));
    assert_eq!(std::fs::read_to_string(&audio).unwrap(), spoken.text);

    let silent = detector
        .detect(DetectionRequest::new(red(), Mode::Text))
        .await
        .unwrap();
    assert!(silent.audio.is_none());
    assert_eq!(silent.text, spoken.text);

    let spoken_again = detector
        .detect(DetectionRequest::new(red(), Mode::Text).with_audio(true))
        .await
        .unwrap();
    assert_eq!(spoken_again.audio, Some(audio));
    assert_eq!(synth.calls(), 1);
}

#[tokio::test]
async fn test_cached_result_without_audio_gets_audio_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let synth = FakeSynth::working();
    let backend = FakeBackend::replying("STOP");
    let detector = Detector::new(backend.clone())
        .with_audio(AudioCache::new(synth.clone(), dir.path(), 16, 2));

    detector
        .detect(DetectionRequest::new(red(), Mode::Text))
        .await
        .unwrap();
    let spoken = detector
        .detect(DetectionRequest::new(red(), Mode::Text).with_audio(true))
        .await
        .unwrap();

    assert_eq!(backend.calls(), 1);
    assert!(spoken.audio.is_some());
    assert_eq!(synth.calls(), 1);
}

#[tokio::test]
async fn test_modes_listed_in_order() {
    let detector = Detector::new(FakeBackend::replying("unused"));
    let modes: Vec<Mode> = detector.available_modes().iter().map(|d| d.mode).collect();
    assert_eq!(modes, Mode::ALL.to_vec());
}

#[tokio::test]
async fn test_detector_is_shareable_across_tasks() {
    let backend = FakeBackend::replying("A table and a chair");
    let detector = Arc::new(Detector::new(backend.clone()));

    let tasks: Vec<_> = (0..8u8)
        .map(|i| {
            let detector = Arc::clone(&detector);
            tokio::spawn(async move {
                let image = ImageInput::Decoded(solid_image([i * 30, 0, 0]));
                detector.detect(DetectionRequest::new(image, Mode::Scene)).await
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
    assert_eq!(backend.calls(), 8);
    assert_eq!(detector.cache_stats().size, 8);
}
