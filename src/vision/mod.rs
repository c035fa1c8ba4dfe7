// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision side of the pipeline
//!
//! This module provides:
//! - Image loading and normalization
//! - Content fingerprints for cache keys
//! - The inference backend seam and its VLM sidecar implementation

pub mod backend;
pub mod fingerprint;
pub mod image_utils;
pub mod vlm_client;

pub use backend::{InferenceBackend, InferenceError};
pub use fingerprint::fingerprint;
pub use image_utils::{
    decode_base64_image, decode_image_bytes, detect_format, load_image_path, normalize_rgb,
    resize_smart, ImageError, ImageInfo,
};
pub use vlm_client::VlmClient;
