// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text cleaning, keyword matching and the shared confidence heuristic

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use super::types::PostProcessError;

/// Control tokens emitted by vision-language decoders
const SPECIAL_TOKENS: &[&str] = &["</s>", "<s>", "<pad>", "[PAD]", "[CLS]", "[SEP]"];

/// Suffixes tolerated after a keyword so "laugh" matches "laughing"
const INFLECTIONS: &[&str] = &["", "s", "es", "ed", "ing", "ter"];

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)*").unwrap());
static DOT_THOUSANDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\.(\d{3})").unwrap());
static COMMA_THOUSANDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d),(\d{3})").unwrap());

/// Remove decoder control tokens and collapse whitespace
pub fn clean(text: &str) -> String {
    let mut text = text.to_string();
    for token in SPECIAL_TOKENS {
        text = text.replace(token, "");
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the usable text from raw backend output
///
/// Backends may answer with a JSON object keyed by task prompt
/// (`{"<OCR>": "..."}`) instead of plain text. The entry for `prompt`
/// is used, or the only entry when there is exactly one.
pub fn extract_payload(raw: &str, prompt: &str) -> Result<String, PostProcessError> {
    let cleaned = clean(raw);
    if !(cleaned.starts_with('{') && cleaned.ends_with('}')) {
        return Ok(cleaned);
    }

    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| PostProcessError::MalformedOutput {
            reason: e.to_string(),
        })?;

    let object = value
        .as_object()
        .ok_or_else(|| PostProcessError::MalformedOutput {
            reason: "expected a JSON object".to_string(),
        })?;

    let entry = match object.get(prompt) {
        Some(entry) => entry,
        None if object.len() == 1 => object.values().next().ok_or_else(|| {
            PostProcessError::MissingTaskKey {
                prompt: prompt.to_string(),
            }
        })?,
        None => {
            return Err(PostProcessError::MissingTaskKey {
                prompt: prompt.to_string(),
            })
        }
    };

    entry
        .as_str()
        .map(clean)
        .ok_or_else(|| PostProcessError::MalformedOutput {
            reason: format!("entry for '{}' is not a string", prompt),
        })
}

/// Lowercased alphanumeric words of `text`
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn word_matches(word: &str, keyword: &str) -> bool {
    word.strip_prefix(keyword)
        .map(|rest| INFLECTIONS.contains(&rest))
        .unwrap_or(false)
}

/// Word ranges of `words` where `keyword` (one or more words) occurs
pub fn keyword_spans(words: &[String], keyword: &str) -> Vec<Range<usize>> {
    let parts: Vec<String> = keyword
        .split_whitespace()
        .map(|p| p.to_lowercase())
        .collect();
    if parts.is_empty() || parts.len() > words.len() {
        return Vec::new();
    }

    words
        .windows(parts.len())
        .enumerate()
        .filter(|(_, window)| {
            window
                .iter()
                .zip(&parts)
                .all(|(word, part)| word_matches(word, part))
        })
        .map(|(start, _)| start..start + parts.len())
        .collect()
}

/// Whether `keyword` (one or more words) occurs in `words` as whole words
pub fn matches_keyword(words: &[String], keyword: &str) -> bool {
    !keyword_spans(words, keyword).is_empty()
}

/// Number of keywords from `keywords` present in `words`
pub fn count_keywords(words: &[String], keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|kw| matches_keyword(words, kw))
        .count()
}

/// Heuristic check that text is prose rather than noise
pub fn is_coherent(text: &str, min_words: usize) -> bool {
    if text.trim().chars().count() < 5 {
        return false;
    }
    if text.split_whitespace().count() < min_words {
        return false;
    }

    let total = text.chars().count();
    let special = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && *c != ' ')
        .count();
    (special as f32 / total as f32) <= 0.3
}

/// Shared confidence skeleton used by every mode
///
/// Starts at 0.5, +0.2 for coherent text, +0.1 per pattern match up to
/// +0.3, -0.2 under 10 characters or -0.1 over 500, clamped to [0, 1].
pub fn calculate_confidence(text: &str, patterns_matched: usize) -> f32 {
    let mut confidence = 0.5;

    if is_coherent(text, 3) {
        confidence += 0.2;
    }

    if patterns_matched > 0 {
        confidence += (patterns_matched as f32 * 0.1).min(0.3);
    }

    let length = text.chars().count();
    if length < 10 {
        confidence -= 0.2;
    } else if length > 500 {
        confidence -= 0.1;
    }

    clamp_confidence(confidence)
}

pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Truncate to at most `max_length` characters on a word boundary, appending "..."
pub fn truncate(text: &str, max_length: usize) -> String {
    const SUFFIX: &str = "...";
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let keep = max_length.saturating_sub(SUFFIX.len());
    let head: String = text.chars().take(keep).collect();
    let head = match head.rsplit_once(' ') {
        Some((before, _)) => before.to_string(),
        None => head,
    };
    format!("{}{}", head, SUFFIX)
}

/// All numbers in `text`, keeping their separators
pub fn extract_numbers(text: &str) -> Vec<String> {
    NUMBER_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Remove thousands separators: "Rp 1.000.000" becomes "Rp 1000000"
pub fn normalize_currency(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = DOT_THOUSANDS_RE.replace_all(&current, "$1$2");
        let next = COMMA_THOUSANDS_RE.replace_all(&next, "$1$2").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}
