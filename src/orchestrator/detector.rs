// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end detection pipeline
//!
//! load -> fingerprint -> result cache -> inference -> mode post-processing
//! -> translation -> speech -> store. Only image loading, mode selection and
//! inference can fail a request; the later stages degrade in place.

use anyhow::Context;
use futures::future::join_all;
use image::DynamicImage;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::types::{DetectionError, DetectionRequest, DetectionStage, ImageInput};
use crate::cache::{CacheError, CacheStats, ResultCache};
use crate::config::DaraConfig;
use crate::modes::{
    descriptors, fallback_output, handler_for, DetectionResult, Language, Mode, ModeDescriptor,
};
use crate::services::{
    AudioCache, EspeakSynthesizer, LibreTranslateClient, Translated, TranslationCache, Translator,
};
use crate::vision::{fingerprint, resize_smart, InferenceBackend, InferenceError, VlmClient};

const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_TRANSLATION_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_IMAGE_SIZE: u32 = 1024;

/// Orchestrates detections; owns every cache for its lifetime
pub struct Detector {
    backend: Arc<dyn InferenceBackend>,
    backend_name: String,
    results: Option<ResultCache>,
    translations: TranslationCache,
    audio: Option<AudioCache>,
    inference_timeout: Duration,
    max_image_size: u32,
}

impl Detector {
    /// Detector with an in-memory result cache and no translation or speech
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        let backend_name = backend.name();
        Self {
            backend,
            backend_name,
            results: Some(ResultCache::new(100, None)),
            translations: TranslationCache::new(None, 500, DEFAULT_TRANSLATION_TIMEOUT),
            audio: None,
            inference_timeout: DEFAULT_INFERENCE_TIMEOUT,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
        }
    }

    /// Replace the result cache; `None` disables result caching
    pub fn with_result_cache(mut self, cache: Option<ResultCache>) -> Self {
        self.results = cache;
        self
    }

    pub fn with_translations(mut self, translations: TranslationCache) -> Self {
        self.translations = translations;
        self
    }

    pub fn with_translator(self, translator: Arc<dyn Translator>) -> Self {
        self.with_translations(TranslationCache::new(
            Some(translator),
            500,
            DEFAULT_TRANSLATION_TIMEOUT,
        ))
    }

    pub fn with_audio(mut self, audio: AudioCache) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    pub fn with_max_image_size(mut self, max_image_size: u32) -> Self {
        self.max_image_size = max_image_size;
        self
    }

    /// Wire the VLM client, translator, speech engine and caches from configuration
    pub fn from_config(config: &DaraConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let backend = VlmClient::new(
            &config.inference.vlm_endpoint,
            &config.inference.vlm_model,
            config.inference.max_tokens,
            config.inference_timeout(),
        )
        .context("Failed to create VLM client")?;

        let results = config.cache.enabled.then(|| match &config.cache.persist_path {
            Some(path) => ResultCache::with_persistence(
                config.cache.result_cache_size,
                config.result_ttl(),
                path.clone(),
            ),
            None => ResultCache::new(config.cache.result_cache_size, config.result_ttl()),
        });

        let translator: Option<Arc<dyn Translator>> = match &config.translation.endpoint {
            Some(endpoint) => Some(Arc::new(
                LibreTranslateClient::new(
                    endpoint,
                    config.translation.api_key.clone(),
                    config.translation_timeout(),
                )
                .context("Failed to create translation client")?,
            )),
            None => {
                info!("No translation endpoint configured, results stay in English");
                None
            }
        };

        let mut detector = Self::new(Arc::new(backend))
            .with_result_cache(results)
            .with_translations(TranslationCache::new(
                translator,
                config.cache.translation_cache_size,
                config.translation_timeout(),
            ))
            .with_inference_timeout(config.inference_timeout())
            .with_max_image_size(config.inference.max_image_size);

        if config.tts.enabled {
            let synthesizer = EspeakSynthesizer::new(&config.tts.engine_binary, config.tts.rate);
            detector = detector.with_audio(AudioCache::new(
                Arc::new(synthesizer),
                config.tts.cache_dir.clone(),
                config.cache.audio_cache_size,
                config.tts.max_workers,
            ));
        }

        Ok(detector)
    }

    /// Run one detection
    pub async fn detect(&self, request: DetectionRequest) -> Result<DetectionResult, DetectionError> {
        let span = info_span!(
            "detect",
            request_id = %Uuid::new_v4(),
            mode = %request.mode,
            language = %request.language
        );

        async {
            debug!(stage = %DetectionStage::Idle, "detection started");
            let image = request.image.load().map_err(|e| self.failed(e.into()))?;
            debug!(stage = %DetectionStage::Loaded, "image loaded");

            let fp = fingerprint(&image);
            self.run(
                &image,
                &fp,
                request.mode,
                request.language,
                request.generate_audio,
            )
            .await
            .map_err(|e| self.failed(e))
        }
        .instrument(span)
        .await
    }

    /// Run one detection with the mode given as text
    ///
    /// An unknown mode is rejected before the image is touched.
    pub async fn detect_str(
        &self,
        image: ImageInput,
        mode: &str,
        language: Language,
        generate_audio: bool,
    ) -> Result<DetectionResult, DetectionError> {
        let mode: Mode = mode
            .parse()
            .map_err(|_| self.failed(DetectionError::invalid_mode(mode)))?;
        self.detect(
            DetectionRequest::new(image, mode)
                .language(language)
                .with_audio(generate_audio),
        )
        .await
    }

    /// Run every mode on one image concurrently, without audio
    ///
    /// The image is loaded once; a failing mode is reported in place.
    pub async fn detect_all(
        &self,
        image: ImageInput,
        language: Language,
    ) -> Result<BTreeMap<Mode, Result<DetectionResult, String>>, DetectionError> {
        let image = image.load().map_err(|e| self.failed(e.into()))?;
        let fp = fingerprint(&image);

        let runs = Mode::ALL.iter().map(|mode| {
            let image = &image;
            let fp = &fp;
            let span = info_span!("detect", request_id = %Uuid::new_v4(), mode = %mode);
            async move {
                let outcome = self
                    .run(image, fp, *mode, language, false)
                    .await
                    .map_err(|e| self.failed(e).to_string());
                (*mode, outcome)
            }
            .instrument(span)
        });

        Ok(join_all(runs).await.into_iter().collect())
    }

    pub fn available_modes(&self) -> Vec<ModeDescriptor> {
        descriptors()
    }

    /// Empty the result and translation caches, returning how many results were dropped
    pub fn clear_cache(&self) -> usize {
        let translations = self.translations.clear();
        let results = self.results.as_ref().map(|c| c.clear()).unwrap_or(0);
        info!(results, translations, "caches cleared");
        results
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.results
            .as_ref()
            .map(|c| c.stats())
            .unwrap_or_default()
    }

    /// Save the result cache to disk when persistence is configured
    pub fn persist(&self) -> Result<usize, CacheError> {
        match &self.results {
            Some(cache) => cache.persist(),
            None => Ok(0),
        }
    }

    fn failed(&self, error: DetectionError) -> DetectionError {
        warn!(stage = %DetectionStage::Failed(error.kind()), error = %error, "detection failed");
        error
    }

    async fn run(
        &self,
        image: &DynamicImage,
        fp: &str,
        mode: Mode,
        language: Language,
        generate_audio: bool,
    ) -> Result<DetectionResult, DetectionError> {
        let started = Instant::now();
        let key = ResultCache::key(fp, mode, language);

        if let Some(cache) = &self.results {
            let cached = cache.get(&key);
            debug!(stage = %DetectionStage::CacheChecked, hit = cached.is_some());
            if let Some(mut result) = cached {
                debug!(stage = %DetectionStage::CacheHit, "serving cached result");
                result.audio = match (generate_audio, result.audio.take()) {
                    (false, _) => None,
                    (true, Some(path)) => Some(path),
                    (true, None) => self.synthesize(&result.text, language).await,
                };
                return Ok(result);
            }
        }
        debug!(stage = %DetectionStage::CacheMiss, "running inference");

        let handler = handler_for(mode);
        let prepared = resize_smart(image.clone(), self.max_image_size);
        let raw = self.infer(&prepared, handler.prompt()).await?;
        debug!(stage = %DetectionStage::Inferred, chars = raw.len());

        let (output, post_processed) = match handler.process(&raw, language) {
            Ok(output) => (output, true),
            Err(e) => {
                warn!(error = %e, "post-processing failed, returning raw output");
                (fallback_output(&raw, &e), false)
            }
        };
        debug!(stage = %DetectionStage::PostProcessed, confidence = output.confidence);

        let translated = if output.translatable && !language.is_default() {
            self.translations
                .translate_or_original(&output.text, language)
                .await
        } else {
            Translated {
                text: output.text.clone(),
                degraded: false,
            }
        };
        debug!(stage = %DetectionStage::Translated, degraded = translated.degraded);

        let audio = if generate_audio {
            self.synthesize(&translated.text, language).await
        } else {
            None
        };
        debug!(stage = %DetectionStage::Synthesized, audio = audio.is_some());

        let result = output.into_result(mode, language, translated.text, audio);

        // A missing audio file is the only gap a stored result may have
        match &self.results {
            Some(cache) if post_processed && !translated.degraded => {
                cache.set(&key, result.clone());
                debug!(stage = %DetectionStage::Stored);
            }
            Some(_) => debug!("degraded result not cached"),
            None => {}
        }

        info!(
            stage = %DetectionStage::Done,
            elapsed_ms = started.elapsed().as_millis() as u64,
            confidence = result.confidence,
            "detection complete"
        );
        Ok(result)
    }

    async fn infer(&self, image: &DynamicImage, prompt: &str) -> Result<String, DetectionError> {
        let started = Instant::now();
        let outcome =
            tokio::time::timeout(self.inference_timeout, self.backend.infer(image, prompt)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(raw)) => {
                debug!(backend = %self.backend_name, prompt, elapsed_ms, "inference complete");
                Ok(raw)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(InferenceError::Timeout(self.inference_timeout).into()),
        }
    }

    async fn synthesize(&self, text: &str, language: Language) -> Option<PathBuf> {
        let audio = self.audio.as_ref()?;
        match audio.get_or_synthesize(text, language).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "speech synthesis failed, result has no audio");
                None
            }
        }
    }
}
