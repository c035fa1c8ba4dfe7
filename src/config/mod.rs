// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration loaded from environment variables

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::modes::Language;

/// Complete configuration of a detection node
#[derive(Debug, Clone)]
pub struct DaraConfig {
    pub cache: CacheSettings,
    pub inference: InferenceSettings,
    pub translation: TranslationSettings,
    pub tts: TtsSettings,
    /// Port for the HTTP API
    pub api_port: u16,
    /// Language used when a request does not name one
    pub default_language: String,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Whether detection results are cached at all
    pub enabled: bool,
    pub result_cache_size: usize,
    /// Optional expiry for cached results
    pub result_cache_ttl_secs: Option<u64>,
    /// JSON file the result cache is loaded from and saved to
    pub persist_path: Option<PathBuf>,
    pub translation_cache_size: usize,
    pub audio_cache_size: usize,
}

#[derive(Debug, Clone)]
pub struct InferenceSettings {
    pub vlm_endpoint: String,
    pub vlm_model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    /// Longest image side sent to the backend, in pixels
    pub max_image_size: u32,
}

#[derive(Debug, Clone)]
pub struct TranslationSettings {
    /// LibreTranslate-compatible endpoint; translation is off when unset
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct TtsSettings {
    pub enabled: bool,
    pub engine_binary: String,
    /// Words per minute
    pub rate: u32,
    pub cache_dir: PathBuf,
    pub max_workers: usize,
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off"))
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl DaraConfig {
    /// Load configuration from environment variables, defaulting anything unset
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache: CacheSettings {
                enabled: env_flag("DARA_ENABLE_CACHE", defaults.cache.enabled),
                result_cache_size: env_parse("DARA_CACHE_SIZE", defaults.cache.result_cache_size),
                result_cache_ttl_secs: env_opt("DARA_CACHE_TTL_SECS").and_then(|v| v.parse().ok()),
                persist_path: env_opt("DARA_CACHE_PERSIST_PATH").map(PathBuf::from),
                translation_cache_size: env_parse(
                    "DARA_TRANSLATION_CACHE_SIZE",
                    defaults.cache.translation_cache_size,
                ),
                audio_cache_size: env_parse("DARA_AUDIO_CACHE_SIZE", defaults.cache.audio_cache_size),
            },
            inference: InferenceSettings {
                vlm_endpoint: env_opt("VLM_ENDPOINT").unwrap_or(defaults.inference.vlm_endpoint),
                vlm_model: env_opt("VLM_MODEL_NAME").unwrap_or(defaults.inference.vlm_model),
                max_tokens: env_parse("DARA_MAX_TOKENS", defaults.inference.max_tokens),
                timeout_ms: env_parse("DARA_INFERENCE_TIMEOUT_MS", defaults.inference.timeout_ms),
                max_image_size: env_parse("DARA_MAX_IMAGE_SIZE", defaults.inference.max_image_size),
            },
            translation: TranslationSettings {
                endpoint: env_opt("DARA_TRANSLATE_URL"),
                api_key: env_opt("DARA_TRANSLATE_API_KEY"),
                timeout_ms: env_parse("DARA_TRANSLATE_TIMEOUT_MS", defaults.translation.timeout_ms),
            },
            tts: TtsSettings {
                enabled: env_flag("DARA_TTS_ENABLED", defaults.tts.enabled),
                engine_binary: env_opt("DARA_TTS_ENGINE").unwrap_or(defaults.tts.engine_binary),
                rate: env_parse("DARA_TTS_RATE", defaults.tts.rate),
                cache_dir: env_opt("DARA_TTS_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.tts.cache_dir),
                max_workers: env_parse("DARA_TTS_WORKERS", defaults.tts.max_workers),
            },
            api_port: env_parse("API_PORT", defaults.api_port),
            default_language: env_opt("DARA_DEFAULT_LANGUAGE").unwrap_or(defaults.default_language),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache.result_cache_size == 0 {
            bail!("DARA_CACHE_SIZE must be greater than 0");
        }
        if self.cache.translation_cache_size == 0 || self.cache.audio_cache_size == 0 {
            bail!("Translation and audio cache sizes must be greater than 0");
        }
        if self.cache.result_cache_ttl_secs == Some(0) {
            bail!("DARA_CACHE_TTL_SECS must be greater than 0 when set");
        }
        if self.inference.timeout_ms == 0 {
            bail!("DARA_INFERENCE_TIMEOUT_MS must be greater than 0");
        }
        if self.inference.max_tokens == 0 {
            bail!("DARA_MAX_TOKENS must be greater than 0");
        }
        Url::parse(&self.inference.vlm_endpoint)
            .with_context(|| format!("Invalid VLM_ENDPOINT '{}'", self.inference.vlm_endpoint))?;
        if let Some(endpoint) = &self.translation.endpoint {
            Url::parse(endpoint)
                .with_context(|| format!("Invalid DARA_TRANSLATE_URL '{}'", endpoint))?;
        }
        if self.translation.timeout_ms == 0 {
            bail!("DARA_TRANSLATE_TIMEOUT_MS must be greater than 0");
        }
        if self.tts.max_workers == 0 {
            bail!("DARA_TTS_WORKERS must be greater than 0");
        }
        self.language()?;
        Ok(())
    }

    /// The configured default language, parsed
    pub fn language(&self) -> Result<Language> {
        self.default_language
            .parse()
            .with_context(|| "Invalid DARA_DEFAULT_LANGUAGE")
    }

    pub fn result_ttl(&self) -> Option<Duration> {
        self.cache.result_cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference.timeout_ms)
    }

    pub fn translation_timeout(&self) -> Duration {
        Duration::from_millis(self.translation.timeout_ms)
    }
}

impl Default for DaraConfig {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                enabled: true,
                result_cache_size: 100,
                result_cache_ttl_secs: None,
                persist_path: None,
                translation_cache_size: 500,
                audio_cache_size: 200,
            },
            inference: InferenceSettings {
                vlm_endpoint: "http://localhost:8081".to_string(),
                vlm_model: "florence-2-large".to_string(),
                max_tokens: 256,
                timeout_ms: 120_000,
                max_image_size: 1024,
            },
            translation: TranslationSettings {
                endpoint: None,
                api_key: None,
                timeout_ms: 5_000,
            },
            tts: TtsSettings {
                enabled: true,
                engine_binary: "espeak-ng".to_string(),
                rate: 150,
                cache_dir: PathBuf::from(".cache/tts"),
                max_workers: 2,
            },
            api_port: 8080,
            default_language: "en".to_string(),
        }
    }
}
