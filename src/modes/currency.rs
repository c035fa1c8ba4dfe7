// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Banknote identification for Indonesian Rupiah, with a fallback for
//! foreign currency symbols

use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use super::text_utils::{
    calculate_confidence, clamp_confidence, extract_numbers, extract_payload, keyword_spans,
    normalize_currency, words,
};
use super::types::{Language, Metadata, Mode, ModeDescriptor, ModeOutput, PostProcessError};
use super::ModeHandler;

/// Flat bonus on top of the shared confidence when a Rupiah note matched
const IDR_CONFIDENCE_BONUS: f32 = 0.2;
const MAX_FALLBACK_NUMBERS: usize = 3;

/// One Rupiah banknote
#[derive(Debug)]
pub struct Denomination {
    pub value: u64,
    pub value_text: &'static str,
    pub color_en: &'static str,
    pub color_id: &'static str,
    pub figure: &'static str,
    /// Spelled-out forms; numeric forms are matched on the value itself
    pub phrases: &'static [&'static str],
}

impl Denomination {
    fn color(&self, language: Language) -> &'static str {
        match language {
            Language::English => self.color_en,
            Language::Indonesian => self.color_id,
        }
    }
}

/// Notes in circulation, largest first
pub const IDR_DENOMINATIONS: &[Denomination] = &[
    Denomination {
        value: 100_000,
        value_text: "Rp 100.000",
        color_en: "red/pink",
        color_id: "merah/pink",
        figure: "Soekarno-Hatta",
        phrases: &["seratus ribu", "hundred thousand"],
    },
    Denomination {
        value: 75_000,
        value_text: "Rp 75.000",
        color_en: "red-white",
        color_id: "merah-putih",
        figure: "Kemerdekaan",
        phrases: &["tujuh puluh lima ribu", "seventy five thousand"],
    },
    Denomination {
        value: 50_000,
        value_text: "Rp 50.000",
        color_en: "blue",
        color_id: "biru",
        figure: "I Gusti Ngurah Rai",
        phrases: &["lima puluh ribu", "fifty thousand"],
    },
    Denomination {
        value: 20_000,
        value_text: "Rp 20.000",
        color_en: "green",
        color_id: "hijau",
        figure: "Otto Iskandar Dinata",
        phrases: &["dua puluh ribu", "twenty thousand"],
    },
    Denomination {
        value: 10_000,
        value_text: "Rp 10.000",
        color_en: "purple",
        color_id: "ungu",
        figure: "Frans Kaisiepo",
        phrases: &["sepuluh ribu", "ten thousand"],
    },
    Denomination {
        value: 5_000,
        value_text: "Rp 5.000",
        color_en: "brown",
        color_id: "coklat",
        figure: "Idham Chalid",
        phrases: &["lima ribu", "five thousand"],
    },
    Denomination {
        value: 2_000,
        value_text: "Rp 2.000",
        color_en: "gray",
        color_id: "abu-abu",
        figure: "M. Hoesni Thamrin",
        phrases: &["dua ribu", "two thousand"],
    },
    Denomination {
        value: 1_000,
        value_text: "Rp 1.000",
        color_en: "light green",
        color_id: "hijau muda",
        figure: "Tjut Meutia",
        phrases: &["seribu", "one thousand"],
    },
];

static RUPIAH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\brp\.?\s*(\d[\d.,]*)").unwrap());

/// Sen or dash fraction after a Rupiah amount: "Rp 50.000,00", "Rp 20.000,-"
static RUPIAH_FRACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\brp\.?\s*\d[\d.]*),(?:\d{1,2}\b|-)").unwrap());

static FOREIGN_CURRENCIES: LazyLock<Vec<(&'static str, &'static str, Regex)>> =
    LazyLock::new(|| {
        vec![
            ("USD", "$", Regex::new(r"\$\s*\d[\d.,]*").unwrap()),
            ("EUR", "€", Regex::new(r"€\s*\d[\d.,]*").unwrap()),
            ("GBP", "£", Regex::new(r"£\s*\d[\d.,]*").unwrap()),
        ]
    });

#[derive(Debug, Clone, Serialize)]
pub struct ForeignAmount {
    pub currency: &'static str,
    pub value: String,
    pub symbol: &'static str,
}

/// Currency recognition for cash handling
pub struct CurrencyMode;

impl CurrencyMode {
    /// Rupiah notes mentioned in `text`, in table order, each at most once
    pub fn detect_idr(text: &str) -> Vec<&'static Denomination> {
        let whole = RUPIAH_FRACTION_RE.replace_all(text, "$1");
        let normalized = normalize_currency(&whole);

        let mut numbers: BTreeSet<u64> = extract_numbers(&normalized)
            .iter()
            .filter_map(|n| n.parse().ok())
            .collect();
        numbers.extend(
            RUPIAH_RE
                .captures_iter(&normalized)
                .filter_map(|c| c.get(1))
                .filter_map(|m| m.as_str().replace(['.', ','], "").parse::<u64>().ok()),
        );

        let tokens = words(text);
        let mut consumed: Vec<Range<usize>> = Vec::new();

        IDR_DENOMINATIONS
            .iter()
            .filter(|denom| {
                if numbers.contains(&denom.value) {
                    return true;
                }
                Self::claim_phrase(&tokens, denom.phrases, &mut consumed)
            })
            .collect()
    }

    /// Match a spelled-out amount whose words are not already part of a larger amount
    fn claim_phrase(tokens: &[String], phrases: &[&str], consumed: &mut Vec<Range<usize>>) -> bool {
        for phrase in phrases {
            let free = keyword_spans(tokens, phrase).into_iter().find(|span| {
                !consumed
                    .iter()
                    .any(|taken| span.start < taken.end && taken.start < span.end)
            });
            if let Some(span) = free {
                consumed.push(span);
                return true;
            }
        }
        false
    }

    pub fn detect_foreign(text: &str) -> Vec<ForeignAmount> {
        FOREIGN_CURRENCIES
            .iter()
            .flat_map(|(currency, symbol, re)| {
                let (currency, symbol) = (*currency, *symbol);
                re.find_iter(text).map(move |m| ForeignAmount {
                    currency,
                    value: m.as_str().trim_end_matches(['.', ',']).to_string(),
                    symbol,
                })
            })
            .collect()
    }

    fn format_idr(detected: &[&Denomination], language: Language) -> String {
        let parts: Vec<String> = detected
            .iter()
            .map(|d| match language {
                Language::English => format!("{} ({} color)", d.value_text, d.color_en),
                Language::Indonesian => format!("{} (warna {})", d.value_text, d.color_id),
            })
            .collect();

        let prefix = match language {
            Language::English => "Detected",
            Language::Indonesian => "Terdeteksi",
        };

        if detected.len() > 1 {
            let total: u64 = detected.iter().map(|d| d.value).sum();
            format!(
                "{}: {}. Total: Rp {}",
                prefix,
                parts.join(", "),
                group_thousands(total)
            )
        } else {
            format!("{}: {}", prefix, parts.join(", "))
        }
    }

    fn format_foreign(detected: &[ForeignAmount], language: Language) -> String {
        let parts: Vec<String> = detected
            .iter()
            .map(|d| format!("{} ({})", d.value, d.currency))
            .collect();
        match language {
            Language::English => format!("Foreign currency detected: {}", parts.join(", ")),
            Language::Indonesian => format!("Mata uang asing terdeteksi: {}", parts.join(", ")),
        }
    }

    fn format_fallback(text: &str, language: Language) -> String {
        let numbers: Vec<String> = extract_numbers(text)
            .into_iter()
            .take(MAX_FALLBACK_NUMBERS)
            .collect();

        match (numbers.is_empty(), language) {
            (false, Language::English) => format!("Numbers detected: {}", numbers.join(", ")),
            (false, Language::Indonesian) => format!("Angka terdeteksi: {}", numbers.join(", ")),
            (true, Language::English) => "Currency not detected.".to_string(),
            (true, Language::Indonesian) => "Mata uang tidak terdeteksi.".to_string(),
        }
    }

    fn suggestions(detected: &[&Denomination], language: Language) -> Vec<String> {
        let mut suggestions = vec![match language {
            Language::English => "Verify security features".to_string(),
            Language::Indonesian => "Periksa ciri-ciri keamanan uang".to_string(),
        }];
        if let Some(primary) = detected.first() {
            suggestions.push(match language {
                Language::English => format!("Primary color: {}", primary.color_en),
                Language::Indonesian => format!("Warna utama: {}", primary.color_id),
            });
        }
        suggestions
    }
}

/// 150000 -> "150.000"
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

impl ModeHandler for CurrencyMode {
    fn descriptor(&self) -> ModeDescriptor {
        ModeDescriptor {
            mode: Mode::Currency,
            prompt: "<OCR>",
            description: "Identifies Indonesian Rupiah and other currencies",
        }
    }

    fn process(&self, raw_output: &str, language: Language) -> Result<ModeOutput, PostProcessError> {
        let text = extract_payload(raw_output, self.prompt())?;

        let idr = Self::detect_idr(&text);
        let foreign = Self::detect_foreign(&text);

        let output_text = if !idr.is_empty() {
            Self::format_idr(&idr, language)
        } else if !foreign.is_empty() {
            Self::format_foreign(&foreign, language)
        } else {
            Self::format_fallback(&text, language)
        };

        let mut confidence = calculate_confidence(&text, idr.len() + foreign.len());
        if !idr.is_empty() {
            confidence = clamp_confidence(confidence + IDR_CONFIDENCE_BONUS);
        }

        let idr_detected: Vec<serde_json::Value> = idr
            .iter()
            .map(|d| {
                json!({
                    "denomination": d.value,
                    "value_text": d.value_text,
                    "color": d.color(language),
                    "color_en": d.color_en,
                    "color_id": d.color_id,
                    "figure": d.figure,
                })
            })
            .collect();
        let total_idr: u64 = idr.iter().map(|d| d.value).sum();

        let mut metadata = Metadata::new();
        metadata.insert("idr_detected".to_string(), json!(idr_detected));
        metadata.insert("other_detected".to_string(), json!(foreign));
        metadata.insert("total_idr".to_string(), json!(total_idr));
        metadata.insert("count".to_string(), json!(idr.len() + foreign.len()));

        Ok(ModeOutput {
            text: output_text,
            confidence,
            raw_output: raw_output.to_string(),
            metadata,
            suggestions: Self::suggestions(&idr, language),
            translatable: false,
        })
    }
}
