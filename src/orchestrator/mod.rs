// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection orchestration
//!
//! Ties the inference backend, mode handlers, caches, translation and
//! speech into one request pipeline.

pub mod detector;
pub mod types;

pub use detector::Detector;
pub use types::{DetectionError, DetectionRequest, DetectionStage, FailureKind, ImageInput};
