// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Backends that answer with a JSON object keyed by task prompt

use dara_node::modes::{fallback_output, handler_for, Language, Mode, PostProcessError};

#[test]
fn test_payload_read_from_own_prompt_key() {
    let raw = r#"{"<OCR>": "Rp 5.000</s>", "<CAPTION>": "ignored"}"#;
    let out = handler_for(Mode::Currency)
        .process(raw, Language::English)
        .unwrap();
    assert_eq!(out.metadata["total_idr"], 5000);
    assert_eq!(out.raw_output, raw);
}

#[test]
fn test_single_entry_used_whatever_its_key() {
    let out = handler_for(Mode::Scene)
        .process(r#"{"<DETAILED_CAPTION>": "An open door"}"#, Language::English)
        .unwrap();
    assert_eq!(out.text, "An open door");
}

#[test]
fn test_malformed_payloads_are_errors() {
    let handler = handler_for(Mode::Text);
    assert!(matches!(
        handler.process("{not json}", Language::English),
        Err(PostProcessError::MalformedOutput { .. })
    ));
    assert!(matches!(
        handler.process(r#"{"<CAPTION>": "a", "<OD>": "b"}"#, Language::English),
        Err(PostProcessError::MissingTaskKey { .. })
    ));
}

#[test]
fn test_fallback_keeps_cleaned_raw_text() {
    let raw = "{not json}</s>";
    let err = handler_for(Mode::Medicine)
        .process(raw, Language::English)
        .unwrap_err();
    let out = fallback_output(raw, &err);

    assert_eq!(out.text, "{not json}");
    assert_eq!(out.raw_output, raw);
    assert_eq!(out.metadata["post_processed"], false);
    assert!(out.suggestions.is_empty());
}

#[test]
fn test_braces_inside_plain_text_are_not_structured() {
    let out = handler_for(Mode::Text)
        .process("Menu {special} today", Language::English)
        .unwrap();
    assert_eq!(out.text, "Menu {special} today");
}
