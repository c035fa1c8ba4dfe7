// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint handlers

use axum::{extract::State, Json};
use std::time::Instant;
use tracing::{debug, warn};

use super::request::{DetectAllRequest, DetectRequest};
use super::response::DetectAllResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::modes::DetectionResult;
use crate::orchestrator::{DetectionRequest, ImageInput};

/// POST /v1/detect - Interpret an image in one mode
///
/// # Request
/// - `image`: Base64-encoded image data (required)
/// - `mode`: scene, emotion, medicine, currency or text (required)
/// - `language`: en or id - defaults to the node's configured language
/// - `generateAudio`: attach a synthesized WAV path - defaults to false
///
/// # Errors
/// - 400 Bad Request: missing or undecodable image, unknown mode or language
/// - 502 Bad Gateway: the inference backend failed
/// - 504 Gateway Timeout: the inference backend did not answer in time
pub async fn detect_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<DetectionResult>, ApiError> {
    if let Err(e) = request.validate() {
        warn!("Detect validation failed: {}", e);
        return Err(e);
    }

    let mode = request.mode()?;
    let language = request.language(state.default_language)?;
    debug!(%mode, %language, audio = request.generate_audio, "detect request received");

    let detection = DetectionRequest::new(ImageInput::Base64(request.image()?.to_string()), mode)
        .language(language)
        .with_audio(request.generate_audio);

    let result = state.detector.detect(detection).await?;
    Ok(Json(result))
}

/// POST /v1/detect/all - Interpret an image in every mode
///
/// Per-mode failures are reported inside the response; only an unreadable
/// image fails the whole request.
pub async fn detect_all_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectAllRequest>,
) -> Result<Json<DetectAllResponse>, ApiError> {
    request.validate()?;
    let language = request.language(state.default_language)?;

    let started = Instant::now();
    let results = state
        .detector
        .detect_all(ImageInput::Base64(request.image()?.to_string()), language)
        .await?;

    let response = DetectAllResponse::new(results, started.elapsed().as_millis() as u64);
    if response.failures() > 0 {
        warn!(failures = response.failures(), "detect-all finished with failures");
    }
    Ok(Json(response))
}
