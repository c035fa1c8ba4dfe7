// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types shared by the mode handlers and the detection pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Mode-specific metadata attached to every result
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Interpretation task selecting both the backend prompt and the post-processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Scene,
    Emotion,
    Medicine,
    Currency,
    Text,
}

impl Mode {
    /// Every mode, in the order they are offered to callers
    pub const ALL: [Mode; 5] = [
        Mode::Scene,
        Mode::Emotion,
        Mode::Medicine,
        Mode::Currency,
        Mode::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Scene => "scene",
            Mode::Emotion => "emotion",
            Mode::Medicine => "medicine",
            Mode::Currency => "currency",
            Mode::Text => "text",
        }
    }

    /// Comma-separated list of valid identifiers, for error messages
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a mode identifier does not name one of the five modes
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Output language
///
/// English is the default language: handlers compose their text in English
/// and only non-default languages go through translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "id")]
    Indonesian,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Indonesian];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Indonesian => "id",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Language::default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("unsupported language '{0}' (supported: en, id)")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "id" | "indonesian" | "bahasa" => Ok(Language::Indonesian),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Static description of a mode: the prompt sent to the backend and a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeDescriptor {
    pub mode: Mode,
    pub prompt: &'static str,
    pub description: &'static str,
}

/// Errors raised while post-processing backend output
///
/// Never surfaced to callers: the pipeline falls back to the cleaned raw text.
#[derive(Debug, Error)]
pub enum PostProcessError {
    /// Structured backend output that could not be interpreted
    #[error("malformed backend output: {reason}")]
    MalformedOutput { reason: String },

    /// Structured backend output without an entry for the task prompt
    #[error("backend output has no entry for task '{prompt}'")]
    MissingTaskKey { prompt: String },
}

/// Result of a mode handler, before translation and speech synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct ModeOutput {
    pub text: String,
    pub confidence: f32,
    pub raw_output: String,
    pub metadata: Metadata,
    pub suggestions: Vec<String>,
    /// Whether `text` is English prose that still needs machine translation
    /// for a non-default language. Handlers that compose localized phrasing
    /// themselves leave this unset.
    pub translatable: bool,
}

impl ModeOutput {
    /// Assemble the final result once the pipeline has settled text and audio
    pub fn into_result(
        self,
        mode: Mode,
        language: Language,
        text: String,
        audio: Option<PathBuf>,
    ) -> DetectionResult {
        DetectionResult {
            mode,
            text,
            confidence: self.confidence.clamp(0.0, 1.0),
            raw_output: self.raw_output,
            audio,
            language,
            metadata: self.metadata,
            suggestions: self.suggestions,
        }
    }
}

/// Final, cacheable result of a detection request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub mode: Mode,
    pub text: String,
    /// Heuristic reliability estimate in [0.0, 1.0]
    pub confidence: f32,
    /// Backend output as received, kept for diagnostics
    pub raw_output: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub audio: Option<PathBuf>,
    pub language: Language,
    pub metadata: Metadata,
    pub suggestions: Vec<String>,
}
