// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{AudioSynthesisError, SpeechSynthesizer};
use crate::modes::Language;

/// Offline synthesis through the `espeak-ng` command line
pub struct EspeakSynthesizer {
    binary: String,
    rate: u32,
}

impl EspeakSynthesizer {
    pub fn new(binary: impl Into<String>, rate: u32) -> Self {
        Self {
            binary: binary.into(),
            rate,
        }
    }

    fn voice(language: Language) -> &'static str {
        match language {
            Language::English => "en",
            Language::Indonesian => "id",
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        output: &Path,
    ) -> Result<(), AudioSynthesisError> {
        let mut child = Command::new(&self.binary)
            .arg("-v")
            .arg(Self::voice(language))
            .arg("-s")
            .arg(self.rate.to_string())
            .arg("-w")
            .arg(output)
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AudioSynthesisError::EngineUnavailable(self.binary.clone())
                } else {
                    AudioSynthesisError::EngineFailed(e.to_string())
                }
            })?;

        // Text goes through stdin so it is never parsed as arguments
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| AudioSynthesisError::EngineFailed(e.to_string()))?;
        }

        let result = child
            .wait_with_output()
            .await
            .map_err(|e| AudioSynthesisError::EngineFailed(e.to_string()))?;

        if !result.status.success() {
            return Err(AudioSynthesisError::EngineFailed(
                String::from_utf8_lossy(&result.stderr).trim().to_string(),
            ));
        }

        debug!(voice = Self::voice(language), path = %output.display(), "speech synthesized");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "espeak-ng"
    }
}
