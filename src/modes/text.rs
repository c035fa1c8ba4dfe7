// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! General text reading (signs, addresses, menus) formatted for speech

use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::sync::LazyLock;

use super::text_utils::{extract_payload, is_coherent, matches_keyword, truncate, words};
use super::types::{Language, Metadata, Mode, ModeDescriptor, ModeOutput, PostProcessError};
use super::ModeHandler;

const MAX_SPOKEN_LENGTH: usize = 200;
const MIN_TEXT_LENGTH: usize = 2;
const NO_TEXT_CONFIDENCE: f32 = 0.1;

/// Ordered so that "Jl." wins over "Jl"
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("Jl.", "Jalan"),
    ("Jl", "Jalan"),
    ("No.", "Nomor"),
    ("Tlp.", "Telepon"),
    ("Tlp", "Telepon"),
    ("Hp.", "Handphone"),
    ("Hp", "Handphone"),
];

const SIGN_KEYWORDS: &[&str] = &[
    "exit", "entrance", "warning", "danger", "keluar", "masuk", "awas", "bahaya",
];
const ADDRESS_KEYWORDS: &[&str] = &["jalan", "jl", "street", "blok", "lantai"];
const CONTACT_KEYWORDS: &[&str] = &["telepon", "tlp", "phone", "email", "hp"];
const PRICE_KEYWORDS: &[&str] = &["rp", "harga", "price", "menu"];

static HOUSE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bno\.\s*\d").unwrap());
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+62|\b08)\d[\d\s-]{6,}").unwrap());
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\brp\.?\s*\d|[$€£]\s*\d)").unwrap());

/// Kind of text, used to pick a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextType {
    Sign,
    Address,
    Contact,
    MenuPrice,
    General,
}

impl TextType {
    /// First matching category wins: sign, address, contact, menu/price
    pub fn classify(text: &str) -> TextType {
        let tokens = words(text);
        let any = |keywords: &[&str]| keywords.iter().any(|kw| matches_keyword(&tokens, kw));

        if any(SIGN_KEYWORDS) {
            TextType::Sign
        } else if any(ADDRESS_KEYWORDS) || HOUSE_NUMBER_RE.is_match(text) {
            TextType::Address
        } else if any(CONTACT_KEYWORDS) || PHONE_RE.is_match(text) || text.contains('@') {
            TextType::Contact
        } else if any(PRICE_KEYWORDS) || PRICE_RE.is_match(text) {
            TextType::MenuPrice
        } else {
            TextType::General
        }
    }

    fn suggestion(&self, language: Language) -> &'static str {
        match (self, language) {
            (TextType::Sign, Language::English) => "Sign detected - follow directions",
            (TextType::Sign, Language::Indonesian) => "Tanda terdeteksi - ikuti petunjuk",
            (TextType::Address, Language::English) => "Address detected - useful for navigation",
            (TextType::Address, Language::Indonesian) => {
                "Alamat terdeteksi - berguna untuk navigasi"
            }
            (TextType::Contact, Language::English) => "Contact information detected",
            (TextType::Contact, Language::Indonesian) => "Informasi kontak terdeteksi",
            (TextType::MenuPrice, Language::English) => "Menu or price list detected",
            (TextType::MenuPrice, Language::Indonesian) => "Menu atau daftar harga terdeteksi",
            (TextType::General, Language::English) => "General text extracted",
            (TextType::General, Language::Indonesian) => "Teks umum diekstrak",
        }
    }
}

pub struct TextMode;

impl TextMode {
    /// Shorten and expand abbreviations so the text reads well aloud
    pub fn format_for_speech(text: &str) -> String {
        let expanded = text
            .split_whitespace()
            .map(expand_abbreviation)
            .collect::<Vec<_>>()
            .join(" ");
        truncate(&expanded, MAX_SPOKEN_LENGTH)
    }

    /// Text-reading confidence: rewards word count, penalizes symbol noise
    pub fn confidence(text: &str) -> f32 {
        let mut confidence: f32 = 0.5;

        if is_coherent(text, 2) {
            confidence += 0.2;
        }

        let word_count = text.split_whitespace().count();
        if word_count >= 3 {
            confidence += 0.1;
        }
        if word_count >= 5 {
            confidence += 0.1;
        }

        let total = text.chars().count().max(1);
        let alphanumeric = text.chars().filter(|c| c.is_alphanumeric()).count();
        if (alphanumeric as f32 / total as f32) < 0.5 {
            confidence -= 0.2;
        }

        confidence.clamp(NO_TEXT_CONFIDENCE, 1.0)
    }

    fn no_text(language: Language) -> &'static str {
        match language {
            Language::English => "No text detected.",
            Language::Indonesian => "Tidak ada teks yang terdeteksi.",
        }
    }
}

fn expand_abbreviation(token: &str) -> String {
    for (abbr, full) in ABBREVIATIONS {
        if let Some(rest) = token.strip_prefix(abbr) {
            if rest.chars().all(|c| c.is_ascii_punctuation()) {
                return format!("{}{}", full, rest);
            }
        }
    }
    token.to_string()
}

impl ModeHandler for TextMode {
    fn descriptor(&self) -> ModeDescriptor {
        ModeDescriptor {
            mode: Mode::Text,
            prompt: "<OCR>",
            description: "Extracts and reads text from images",
        }
    }

    fn process(&self, raw_output: &str, language: Language) -> Result<ModeOutput, PostProcessError> {
        let text = extract_payload(raw_output, self.prompt())?;
        let has_text = text.chars().count() >= MIN_TEXT_LENGTH;

        let (output_text, confidence) = if has_text {
            (Self::format_for_speech(&text), Self::confidence(&text))
        } else {
            (Self::no_text(language).to_string(), NO_TEXT_CONFIDENCE)
        };

        let text_type = TextType::classify(&text);

        let mut metadata = Metadata::new();
        metadata.insert("character_count".to_string(), json!(text.chars().count()));
        metadata.insert(
            "word_count".to_string(),
            json!(text.split_whitespace().count()),
        );
        metadata.insert("text_type".to_string(), json!(text_type));
        metadata.insert(
            "has_numbers".to_string(),
            json!(text.chars().any(|c| c.is_ascii_digit())),
        );

        Ok(ModeOutput {
            text: output_text,
            confidence,
            raw_output: raw_output.to_string(),
            metadata,
            suggestions: vec![text_type.suggestion(language).to_string()],
            translatable: has_text,
        })
    }
}
