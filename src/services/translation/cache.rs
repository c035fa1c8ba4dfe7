// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Memoizing front for a `Translator` with a hard timeout

use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{TranslationError, Translator};
use crate::cache::{BoundedCache, CacheStats};
use crate::modes::Language;

/// Text returned by `translate_or_original`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated {
    pub text: String,
    /// The translator failed and `text` is the untranslated input
    pub degraded: bool,
}

pub struct TranslationCache {
    translator: Option<Arc<dyn Translator>>,
    store: BoundedCache<String>,
    timeout: Duration,
}

impl TranslationCache {
    /// `translator` of `None` leaves every text untranslated
    pub fn new(translator: Option<Arc<dyn Translator>>, maxsize: usize, timeout: Duration) -> Self {
        Self {
            translator,
            store: BoundedCache::new("translation", maxsize, None),
            timeout,
        }
    }

    pub fn key(text: &str, source: Language, target: Language) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.code().as_bytes());
        hasher.update(b":");
        hasher.update(target.code().as_bytes());
        hasher.update(b":");
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Translate from the default language into `target`
    ///
    /// Only successful translations are cached.
    pub async fn translate(&self, text: &str, target: Language) -> Result<String, TranslationError> {
        let source = Language::default();
        if target == source || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let translator = self
            .translator
            .as_ref()
            .ok_or(TranslationError::NotConfigured)?;

        let key = Self::key(text, source, target);
        if let Some(cached) = self.store.get(&key) {
            debug!("translation cache hit");
            return Ok(cached);
        }

        let translated = tokio::time::timeout(self.timeout, translator.translate(text, source, target))
            .await
            .map_err(|_| TranslationError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        if translated.trim().is_empty() {
            return Err(TranslationError::EmptyResponse);
        }

        self.store.set(key, translated.clone());
        Ok(translated)
    }

    /// Translate, keeping the original text on any failure
    ///
    /// A missing translator is not a degradation; every other error is.
    pub async fn translate_or_original(&self, text: &str, target: Language) -> Translated {
        match self.translate(text, target).await {
            Ok(translated) => Translated {
                text: translated,
                degraded: false,
            },
            Err(TranslationError::NotConfigured) => {
                debug!(target_lang = %target, "no translator configured, keeping original text");
                Translated {
                    text: text.to_string(),
                    degraded: false,
                }
            }
            Err(e) => {
                warn!(error = %e, target_lang = %target, "translation failed, keeping original text");
                Translated {
                    text: text.to_string(),
                    degraded: true,
                }
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    pub fn clear(&self) -> usize {
        self.store.clear()
    }
}
