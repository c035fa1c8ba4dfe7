// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::modes::{Language, Mode};
use crate::orchestrator::DetectionError;
use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Largest accepted base64 payload, allowing for encoding overhead
const MAX_ENCODED_SIZE: usize = MAX_IMAGE_SIZE / 3 * 4 + 4;

fn require_image(image: &Option<String>) -> Result<&str, ApiError> {
    let image = image
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::ValidationError {
            field: "image".to_string(),
            message: "image is required".to_string(),
        })?;

    if image.len() > MAX_ENCODED_SIZE {
        return Err(ApiError::ValidationError {
            field: "image".to_string(),
            message: format!("image exceeds maximum size of {} bytes", MAX_IMAGE_SIZE),
        });
    }
    Ok(image)
}

fn parse_language(language: &Option<String>, default: Language) -> Result<Language, ApiError> {
    match language.as_deref() {
        None => Ok(default),
        Some(code) => code
            .parse()
            .map_err(|e: crate::modes::UnsupportedLanguage| {
                ApiError::UnsupportedLanguage(e.to_string())
            }),
    }
}

/// Request for a single-mode detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    /// Base64-encoded image data, optionally a data URL
    #[serde(default)]
    pub image: Option<String>,

    /// One of scene, emotion, medicine, currency, text
    #[serde(default)]
    pub mode: Option<String>,

    /// Output language code; the node default when absent
    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub generate_audio: bool,
}

impl DetectRequest {
    /// Validate the request
    pub fn validate(&self) -> Result<(), ApiError> {
        require_image(&self.image)?;
        self.mode()?;
        Ok(())
    }

    pub fn image(&self) -> Result<&str, ApiError> {
        require_image(&self.image)
    }

    pub fn mode(&self) -> Result<Mode, ApiError> {
        let requested = self.mode.as_deref().ok_or_else(|| ApiError::ValidationError {
            field: "mode".to_string(),
            message: "mode is required".to_string(),
        })?;
        requested
            .parse()
            .map_err(|_| DetectionError::invalid_mode(requested).into())
    }

    pub fn language(&self, default: Language) -> Result<Language, ApiError> {
        parse_language(&self.language, default)
    }
}

/// Request to run every mode on one image
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectAllRequest {
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub language: Option<String>,
}

impl DetectAllRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_image(&self.image).map(|_| ())
    }

    pub fn image(&self) -> Result<&str, ApiError> {
        require_image(&self.image)
    }

    pub fn language(&self, default: Language) -> Result<Language, ApiError> {
        parse_language(&self.language, default)
    }
}
