// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /v1/detect and POST /v1/detect/all

use axum::http::StatusCode;
use dara_node::orchestrator::Detector;
use serde_json::json;
use std::time::Duration;

use super::{app, send};
use crate::common::{png_base64, solid_image, Behavior, FakeBackend, FakeTranslator};

fn image_b64() -> String {
    png_base64(&solid_image([200, 200, 0]))
}

#[tokio::test]
async fn test_detect_returns_camel_case_result() {
    let backend = FakeBackend::replying("Rp 50.000");
    let (status, body) = send(
        app(Detector::new(backend.clone())),
        "POST",
        "/v1/detect",
        Some(json!({"image": image_b64(), "mode": "currency"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "currency");
    assert_eq!(body["language"], "en");
    assert_eq!(body["text"], "Detected: Rp 50.000 (blue color)");
    assert_eq!(body["rawOutput"], "Rp 50.000");
    assert!(body.get("audio").is_none());
    assert_eq!(body["metadata"]["total_idr"], 50000);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_detect_accepts_data_url_and_language() {
    let translator = FakeTranslator::working();
    let detector = Detector::new(FakeBackend::replying("A small kitchen"))
        .with_translator(translator.clone());

    let (status, body) = send(
        app(detector),
        "POST",
        "/v1/detect",
        Some(json!({
            "image": format!("data:image/png;base64,{}", image_b64()),
            "mode": "scene",
            "language": "id"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["language"], "id");
    assert_eq!(body["text"], "[id] A small kitchen");
}

#[tokio::test]
async fn test_bad_requests_are_400() {
    let backend = FakeBackend::replying("unused");
    let cases = [
        json!({"mode": "scene"}),
        json!({"image": image_b64(), "mode": "colour"}),
        json!({"image": image_b64()}),
        json!({"image": image_b64(), "mode": "scene", "language": "fr"}),
        json!({"image": "bm90IGFuIGltYWdl", "mode": "scene"}),
    ];

    for body in cases {
        let (status, response) = send(
            app(Detector::new(backend.clone())),
            "POST",
            "/v1/detect",
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert!(response["message"].is_string());
    }
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_invalid_mode_lists_available_modes() {
    let (status, body) = send(
        app(Detector::new(FakeBackend::replying("unused"))),
        "POST",
        "/v1/detect",
        Some(json!({"image": image_b64(), "mode": "colour"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorType"], "invalid_mode");
    assert_eq!(
        body["details"]["available_modes"],
        json!(["scene", "emotion", "medicine", "currency", "text"])
    );
}

#[tokio::test]
async fn test_backend_failure_is_502() {
    let (status, body) = send(
        app(Detector::new(FakeBackend::new(Behavior::Fail))),
        "POST",
        "/v1/detect",
        Some(json!({"image": image_b64(), "mode": "text"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["errorType"], "backend_failure");
}

#[tokio::test]
async fn test_backend_timeout_is_504() {
    let detector = Detector::new(FakeBackend::new(Behavior::Hang))
        .with_inference_timeout(Duration::from_millis(50));
    let (status, body) = send(
        app(detector),
        "POST",
        "/v1/detect",
        Some(json!({"image": image_b64(), "mode": "emotion"})),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["errorType"], "timeout");
}

#[tokio::test]
async fn test_detect_all_reports_every_mode() {
    let backend = FakeBackend::replying("Ibuprofen 200 mg");
    let (status, body) = send(
        app(Detector::new(backend.clone())),
        "POST",
        "/v1/detect/all",
        Some(json!({"image": image_b64()})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_object().unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(results["medicine"]["metadata"]["dosages"][0], "200 mg");
    assert!(body["processingTimeMs"].is_u64());
    assert_eq!(backend.calls(), 5);
}

#[tokio::test]
async fn test_detect_all_reports_failures_inline() {
    let (status, body) = send(
        app(Detector::new(FakeBackend::new(Behavior::Fail))),
        "POST",
        "/v1/detect/all",
        Some(json!({"image": image_b64(), "language": "id"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    for outcome in body["results"].as_object().unwrap().values() {
        assert!(outcome["error"].is_string());
    }
}

#[tokio::test]
async fn test_detect_all_rejects_missing_image() {
    let (status, body) = send(
        app(Detector::new(FakeBackend::replying("unused"))),
        "POST",
        "/v1/detect/all",
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "image");
}
