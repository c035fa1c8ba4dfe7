// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use image::DynamicImage;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::modes::{Language, Mode};
use crate::vision::{
    decode_base64_image, decode_image_bytes, load_image_path, normalize_rgb, ImageError,
    InferenceError,
};

/// Where the image for a detection comes from
#[derive(Debug, Clone)]
pub enum ImageInput {
    Path(PathBuf),
    /// Encoded bytes (PNG, JPEG, ...)
    Bytes(Vec<u8>),
    /// Base64 text, optionally a data URL
    Base64(String),
    Decoded(DynamicImage),
}

impl ImageInput {
    /// Decode and normalize to 8-bit RGB
    pub fn load(&self) -> Result<DynamicImage, ImageError> {
        let image = match self {
            ImageInput::Path(path) => load_image_path(path)?.0,
            ImageInput::Bytes(bytes) => decode_image_bytes(bytes)?.0,
            ImageInput::Base64(data) => decode_base64_image(data)?.0,
            ImageInput::Decoded(image) => image.clone(),
        };
        Ok(normalize_rgb(image))
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        ImageInput::Path(path)
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        ImageInput::Bytes(bytes)
    }
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        ImageInput::Decoded(image)
    }
}

/// One detection request
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub image: ImageInput,
    pub mode: Mode,
    pub language: Language,
    pub generate_audio: bool,
}

impl DetectionRequest {
    pub fn new(image: impl Into<ImageInput>, mode: Mode) -> Self {
        Self {
            image: image.into(),
            mode,
            language: Language::default(),
            generate_audio: false,
        }
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_audio(mut self, generate_audio: bool) -> Self {
        self.generate_audio = generate_audio;
        self
    }
}

/// The only errors a detection surfaces; everything else degrades
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] ImageError),

    #[error("Invalid mode '{requested}'. Available: {available}")]
    InvalidMode { requested: String, available: String },

    #[error("Inference backend failed: {0}")]
    InferenceBackend(#[from] InferenceError),
}

impl DetectionError {
    pub fn invalid_mode(requested: &str) -> Self {
        DetectionError::InvalidMode {
            requested: requested.to_string(),
            available: Mode::available(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            DetectionError::ImageLoad(_) => FailureKind::ImageLoad,
            DetectionError::InvalidMode { .. } => FailureKind::InvalidMode,
            DetectionError::InferenceBackend(_) => FailureKind::InferenceBackend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ImageLoad,
    InvalidMode,
    InferenceBackend,
}

/// Pipeline position of a detection, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStage {
    Idle,
    Loaded,
    CacheChecked,
    CacheHit,
    CacheMiss,
    Inferred,
    PostProcessed,
    Translated,
    Synthesized,
    Stored,
    Done,
    Failed(FailureKind),
}

impl fmt::Display for DetectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionStage::Idle => f.write_str("idle"),
            DetectionStage::Loaded => f.write_str("loaded"),
            DetectionStage::CacheChecked => f.write_str("cache_checked"),
            DetectionStage::CacheHit => f.write_str("cache_hit"),
            DetectionStage::CacheMiss => f.write_str("cache_miss"),
            DetectionStage::Inferred => f.write_str("inferred"),
            DetectionStage::PostProcessed => f.write_str("post_processed"),
            DetectionStage::Translated => f.write_str("translated"),
            DetectionStage::Synthesized => f.write_str("synthesized"),
            DetectionStage::Stored => f.write_str("stored"),
            DetectionStage::Done => f.write_str("done"),
            DetectionStage::Failed(kind) => write!(f, "failed({:?})", kind),
        }
    }
}
