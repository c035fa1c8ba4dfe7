// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Medicine label reading: dosage, usage instructions and expiry date

use regex::Regex;
use serde_json::json;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::text_utils::{calculate_confidence, count_keywords, extract_payload, truncate, words};
use super::types::{Language, Metadata, Mode, ModeDescriptor, ModeOutput, PostProcessError};
use super::ModeHandler;

const MAX_DOSAGES: usize = 5;
const FALLBACK_TEXT_LENGTH: usize = 150;

const MEDICINE_KEYWORDS: &[&str] = &[
    "tablet", "capsule", "syrup", "drops", "cream", "ointment", "injection", "inhaler", "patch",
    "suspension", "solution", "obat", "kapsul", "sirup", "tetes", "krim", "salep",
];

static DOSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?\s*(?:mcg|mg|ml|iu|unit|tablet|capsule|cap|tab|g)s?)\b")
        .unwrap()
});

static INSTRUCTION_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(take\s+\d+\s+(?:time|tablet|capsule|cap|tab)s?(?:\s+(?:a\s+day|daily|per\s+day))?)",
        r"(?i)(minum\s+\d+\s+(?:kali|tablet|kapsul)(?:\s+sehari)?)",
        r"(?i)((?:before|after|with)\s+(?:meal|food|breakfast|lunch|dinner)s?)",
        r"(?i)((?:sebelum|sesudah|bersama)\s+makan)",
        r"(?i)(every\s+\d+\s+hours?)",
        r"(?i)(setiap\s+\d+\s+jam)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static EXPIRY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:exp(?:iry)?|ed|best\s+before)\b[.:\s]*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})",
        r"(?i)\b(?:exp(?:iry)?|ed|best\s+before)\b[.:\s]*(\w+\s+\d{4})",
        r"\b(\d{2}/\d{4})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Medication safety: extracts dosage facts from label text
pub struct MedicineMode;

impl MedicineMode {
    /// Dosage strings, deduplicated case-insensitively, in order of appearance
    pub fn extract_dosages(text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        DOSAGE_RE
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|d| seen.insert(d.to_lowercase()))
            .take(MAX_DOSAGES)
            .collect()
    }

    fn first_match(patterns: &[Regex], text: &str) -> Option<String> {
        patterns.iter().find_map(|re| {
            re.captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
    }

    pub fn extract_instructions(text: &str) -> Option<String> {
        Self::first_match(&INSTRUCTION_RES, text)
    }

    pub fn extract_expiry(text: &str) -> Option<String> {
        Self::first_match(&EXPIRY_RES, text)
    }

    fn is_likely_medicine(text: &str, has_dosage: bool) -> bool {
        has_dosage || count_keywords(&words(text), MEDICINE_KEYWORDS) > 0
    }

    fn safety_suggestions(language: Language) -> Vec<String> {
        let lines: [&str; 3] = match language {
            Language::English => [
                "Always consult a doctor for exact dosage",
                "Check expiry date before use",
                "Read full instructions on packaging",
            ],
            Language::Indonesian => [
                "Selalu konsultasikan dengan dokter",
                "Periksa tanggal kedaluwarsa",
                "Baca petunjuk penggunaan lengkap",
            ],
        };
        lines.iter().map(|s| s.to_string()).collect()
    }
}

impl ModeHandler for MedicineMode {
    fn descriptor(&self) -> ModeDescriptor {
        ModeDescriptor {
            mode: Mode::Medicine,
            prompt: "<OCR>",
            description: "Reads medicine labels and extracts dosage information",
        }
    }

    fn process(&self, raw_output: &str, language: Language) -> Result<ModeOutput, PostProcessError> {
        let text = extract_payload(raw_output, self.prompt())?;

        let dosages = Self::extract_dosages(&text);
        let instructions = Self::extract_instructions(&text);
        let expiry = Self::extract_expiry(&text);

        let mut parts = Vec::new();
        let mut patterns_matched = 0;

        if !dosages.is_empty() {
            parts.push(format!("Dosage: {}", dosages.join(", ")));
            patterns_matched += dosages.len();
        }
        if let Some(ref instructions) = instructions {
            parts.push(format!("Instructions: {}", instructions));
            patterns_matched += 1;
        }
        if let Some(ref expiry) = expiry {
            parts.push(format!("Expiry: {}", expiry));
            patterns_matched += 1;
        }
        if parts.is_empty() {
            parts.push(format!("Text found: {}", truncate(&text, FALLBACK_TEXT_LENGTH)));
        }

        let mut metadata = Metadata::new();
        metadata.insert("dosages".to_string(), json!(dosages));
        metadata.insert("instructions".to_string(), json!(instructions));
        metadata.insert("expiry".to_string(), json!(expiry));
        metadata.insert(
            "is_medicine".to_string(),
            json!(Self::is_likely_medicine(&text, !dosages.is_empty())),
        );

        Ok(ModeOutput {
            text: parts.join(". "),
            confidence: calculate_confidence(&text, patterns_matched),
            raw_output: raw_output.to_string(),
            metadata,
            suggestions: Self::safety_suggestions(language),
            translatable: true,
        })
    }
}
