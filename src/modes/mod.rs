// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection modes
//!
//! Each mode owns the prompt sent to the vision backend and the
//! post-processing that turns the backend's raw text into a user-facing
//! result:
//! - `scene`: environment description with hazard warnings
//! - `emotion`: facial expression reading with social guidance
//! - `medicine`: dosage, instruction and expiry extraction
//! - `currency`: Rupiah denomination matching
//! - `text`: general text reading
//!
//! Handlers are stateless and shared across concurrent requests.

pub mod currency;
pub mod emotion;
pub mod medicine;
pub mod scene;
pub mod text;
pub mod text_utils;
pub mod types;

pub use currency::CurrencyMode;
pub use emotion::EmotionMode;
pub use medicine::MedicineMode;
pub use scene::SceneMode;
pub use text::TextMode;
pub use types::{
    DetectionResult, Language, Metadata, Mode, ModeDescriptor, ModeOutput, PostProcessError,
    UnknownMode, UnsupportedLanguage,
};

use serde_json::json;

/// Post-processing contract shared by the five modes
pub trait ModeHandler: Send + Sync {
    fn descriptor(&self) -> ModeDescriptor;

    /// Task prompt sent to the inference backend
    fn prompt(&self) -> &'static str {
        self.descriptor().prompt
    }

    /// Turn raw backend output into a mode result, without translation or audio
    fn process(&self, raw_output: &str, language: Language) -> Result<ModeOutput, PostProcessError>;
}

/// Handler for `mode`
pub fn handler_for(mode: Mode) -> &'static dyn ModeHandler {
    match mode {
        Mode::Scene => &SceneMode,
        Mode::Emotion => &EmotionMode,
        Mode::Medicine => &MedicineMode,
        Mode::Currency => &CurrencyMode,
        Mode::Text => &TextMode,
    }
}

/// Descriptors of every mode, in presentation order
pub fn descriptors() -> Vec<ModeDescriptor> {
    Mode::ALL
        .iter()
        .map(|mode| handler_for(*mode).descriptor())
        .collect()
}

/// Output used when a handler cannot interpret the backend output
///
/// Carries the cleaned raw text with the base confidence and flags the
/// metadata with `post_processed = false`.
pub fn fallback_output(raw_output: &str, error: &PostProcessError) -> ModeOutput {
    let text = text_utils::clean(raw_output);
    let confidence = text_utils::calculate_confidence(&text, 0);

    let mut metadata = Metadata::new();
    metadata.insert("post_processed".to_string(), json!(false));
    metadata.insert("error".to_string(), json!(error.to_string()));

    ModeOutput {
        text,
        confidence,
        raw_output: raw_output.to_string(),
        metadata,
        suggestions: Vec::new(),
        translatable: true,
    }
}
