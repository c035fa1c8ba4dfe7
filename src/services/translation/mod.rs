// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Machine translation of composed result text
//!
//! Translation is best-effort: every failure degrades to the untranslated
//! text at the `TranslationCache` boundary.

pub mod cache;
pub mod libretranslate;

pub use cache::{Translated, TranslationCache};
pub use libretranslate::LibreTranslateClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::modes::Language;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Translation API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Translation timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Translation from {source_lang} to {target} is not supported")]
    UnsupportedLanguage { source_lang: String, target: String },

    #[error("Translation service returned an empty response")]
    EmptyResponse,

    #[error("No translation service configured")]
    NotConfigured,
}

/// A translation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError>;

    /// Service name for logging
    fn name(&self) -> &'static str;
}
