// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::orchestrator::DetectionError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    ValidationError { field: String, message: String },
    InvalidImage(String),
    InvalidMode { requested: String, available: String },
    UnsupportedLanguage(String),
    BackendFailure(String),
    Timeout(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, details) = match self {
            ApiError::ValidationError { field, .. } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", Some(details))
            }
            ApiError::InvalidImage(_) => ("invalid_image", None),
            ApiError::InvalidMode { available, .. } => {
                let mut details = HashMap::new();
                details.insert(
                    "available_modes".to_string(),
                    serde_json::Value::Array(
                        available
                            .split(", ")
                            .map(|m| serde_json::Value::String(m.to_string()))
                            .collect(),
                    ),
                );
                ("invalid_mode", Some(details))
            }
            ApiError::UnsupportedLanguage(_) => ("unsupported_language", None),
            ApiError::BackendFailure(_) => ("backend_failure", None),
            ApiError::Timeout(_) => ("timeout", None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message: self.to_string(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError { .. }
            | ApiError::InvalidImage(_)
            | ApiError::InvalidMode { .. }
            | ApiError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            ApiError::BackendFailure(_) => StatusCode::BAD_GATEWAY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
            ApiError::InvalidMode {
                requested,
                available,
            } => write!(f, "Invalid mode '{}'. Available: {}", requested, available),
            ApiError::UnsupportedLanguage(msg) => write!(f, "{}", msg),
            ApiError::BackendFailure(msg) => write!(f, "Inference backend failed: {}", msg),
            ApiError::Timeout(msg) => write!(f, "Request timed out: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<DetectionError> for ApiError {
    fn from(error: DetectionError) -> Self {
        match error {
            DetectionError::ImageLoad(e) => ApiError::InvalidImage(e.to_string()),
            DetectionError::InvalidMode {
                requested,
                available,
            } => ApiError::InvalidMode {
                requested,
                available,
            },
            DetectionError::InferenceBackend(e) if e.is_timeout() => {
                ApiError::Timeout(e.to_string())
            }
            DetectionError::InferenceBackend(e) => ApiError::BackendFailure(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
