// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inference backend seam
//!
//! The vision-language model is an external collaborator: it receives a
//! normalized image and a task prompt and answers with raw text.

use async_trait::async_trait;
use image::DynamicImage;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Request(String),

    #[error("inference backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed inference response: {0}")]
    MalformedResponse(String),

    #[error("inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not prepare image for inference: {0}")]
    Image(String),
}

impl InferenceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::Timeout(_))
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            InferenceError::MalformedResponse(e.to_string())
        } else {
            InferenceError::Request(e.to_string())
        }
    }
}

/// A vision-language model that turns an image and a task prompt into text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Run one generation; a single call per detection, never retried here
    async fn infer(&self, image: &DynamicImage, prompt: &str) -> Result<String, InferenceError>;

    /// Backend label for logs
    fn name(&self) -> String;
}
