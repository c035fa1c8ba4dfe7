// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Speech synthesis of result text
//!
//! Audio is best-effort: a failed synthesis leaves the result without audio.

pub mod audio_cache;
pub mod espeak;

pub use audio_cache::AudioCache;
pub use espeak::EspeakSynthesizer;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::modes::Language;

#[derive(Debug, Error)]
pub enum AudioSynthesisError {
    #[error("speech engine '{0}' is not available")]
    EngineUnavailable(String),

    #[error("speech engine failed: {0}")]
    EngineFailed(String),

    #[error("audio file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("synthesis worker stopped: {0}")]
    Worker(String),

    #[error("nothing to synthesize")]
    EmptyText,
}

/// A text-to-speech engine writing WAV audio to a file
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        output: &Path,
    ) -> Result<(), AudioSynthesisError>;

    fn name(&self) -> &'static str;
}
