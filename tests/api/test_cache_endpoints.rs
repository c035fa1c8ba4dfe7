// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Health, mode listing and cache administration endpoints

use axum::http::StatusCode;
use dara_node::orchestrator::Detector;
use serde_json::json;

use super::{app, send};
use crate::common::{png_base64, solid_image, FakeBackend};

#[tokio::test]
async fn test_health() {
    let (status, body) = send(
        app(Detector::new(FakeBackend::replying("unused"))),
        "GET",
        "/health",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_modes_listed_in_order() {
    let (status, body) = send(
        app(Detector::new(FakeBackend::replying("unused"))),
        "GET",
        "/v1/modes",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let modes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["mode"].as_str().unwrap())
        .collect();
    assert_eq!(modes, vec!["scene", "emotion", "medicine", "currency", "text"]);
    assert_eq!(body[0]["prompt"], "<MORE_DETAILED_CAPTION>");
    assert!(body[4]["description"].is_string());
}

#[tokio::test]
async fn test_stats_and_clear_roundtrip() {
    let backend = FakeBackend::replying("EXIT");
    let router = app(Detector::new(backend.clone()));
    let request = json!({
        "image": png_base64(&solid_image([1, 2, 3])),
        "mode": "text"
    });

    for _ in 0..2 {
        let (status, _) = send(router.clone(), "POST", "/v1/detect", Some(request.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, stats) = send(router.clone(), "GET", "/v1/cache/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["size"], 1);
    assert_eq!(stats["maxsize"], 100);
    assert_eq!(stats["hitRate"], 0.5);

    let (status, cleared) = send(router.clone(), "DELETE", "/v1/cache", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared, json!({"cleared": 1}));

    let (_, stats) = send(router.clone(), "GET", "/v1/cache/stats", None).await;
    assert_eq!(stats["size"], 0);

    send(router, "POST", "/v1/detect", Some(request)).await;
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_stats_when_caching_disabled() {
    let detector = Detector::new(FakeBackend::replying("unused")).with_result_cache(None);
    let (status, stats) = send(app(detector), "GET", "/v1/cache/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["size"], 0);
    assert_eq!(stats["hitRate"], 0.0);
}
