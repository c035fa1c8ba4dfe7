// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Emotion reading from a caption of facial expression and body language

use serde::Serialize;
use serde_json::json;

use super::text_utils::{calculate_confidence, count_keywords, extract_payload, words};
use super::types::{Language, Metadata, Mode, ModeDescriptor, ModeOutput, PostProcessError};
use super::ModeHandler;

/// Emotion categories, in tie-breaking order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Fearful,
    Surprised,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Surprised,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Surprised => "surprised",
            Emotion::Neutral => "neutral",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Emotion::Happy => &[
                "smile", "smiling", "happy", "laugh", "joy", "cheerful", "grinning",
            ],
            Emotion::Sad => &[
                "sad", "cry", "crying", "tear", "upset", "frown", "depressed", "down",
            ],
            Emotion::Angry => &[
                "angry", "mad", "furious", "shout", "yelling", "aggressive", "frustrated",
            ],
            Emotion::Fearful => &[
                "fear", "scared", "afraid", "terror", "frightened", "anxious", "worried",
            ],
            Emotion::Surprised => &["surprise", "surprised", "shocked", "amazed", "astonished"],
            Emotion::Neutral => &["neutral", "calm", "serious", "focused"],
        }
    }

    fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (Emotion::Happy, Language::English) => "Happy",
            (Emotion::Sad, Language::English) => "Sad",
            (Emotion::Angry, Language::English) => "Angry",
            (Emotion::Fearful, Language::English) => "Fearful",
            (Emotion::Surprised, Language::English) => "Surprised",
            (Emotion::Neutral, Language::English) => "Neutral",
            (Emotion::Happy, Language::Indonesian) => "Senang",
            (Emotion::Sad, Language::Indonesian) => "Sedih",
            (Emotion::Angry, Language::Indonesian) => "Marah",
            (Emotion::Fearful, Language::Indonesian) => "Takut",
            (Emotion::Surprised, Language::Indonesian) => "Terkejut",
            (Emotion::Neutral, Language::Indonesian) => "Netral",
        }
    }

    fn advice(&self, language: Language) -> &'static str {
        match (self, language) {
            (Emotion::Happy, Language::English) => "They seem in good spirits!",
            (Emotion::Sad, Language::English) => "Offer comfort or support.",
            (Emotion::Angry, Language::English) => "Give them space or ask calmly.",
            (Emotion::Fearful, Language::English) => "Reassure them that they are safe.",
            (Emotion::Surprised, Language::English) => "Something unexpected happened.",
            (Emotion::Neutral, Language::English) => "Ask how they are doing.",
            (Emotion::Happy, Language::Indonesian) => "Mereka terlihat senang!",
            (Emotion::Sad, Language::Indonesian) => "Tawarkan dukungan atau hibur mereka.",
            (Emotion::Angry, Language::Indonesian) => "Beri mereka ruang atau tanya dengan tenang.",
            (Emotion::Fearful, Language::Indonesian) => "Yakinkan mereka bahwa mereka aman.",
            (Emotion::Surprised, Language::Indonesian) => "Sesuatu yang tidak terduga terjadi.",
            (Emotion::Neutral, Language::Indonesian) => "Tanyakan kabar mereka.",
        }
    }

    fn suggestions(&self, language: Language) -> &'static [&'static str] {
        match (self, language) {
            (Emotion::Happy, Language::English) => &[
                "Good time for conversation",
                "They may be receptive to requests",
            ],
            (Emotion::Happy, Language::Indonesian) => &[
                "Waktu yang baik untuk berbicara",
                "Mereka mungkin terbuka untuk permintaan",
            ],
            (Emotion::Sad, Language::English) => &["Speak gently", "Ask if they need anything"],
            (Emotion::Sad, Language::Indonesian) => &[
                "Bicara dengan lembut",
                "Tanyakan apakah mereka butuh sesuatu",
            ],
            (Emotion::Angry, Language::English) => &["Keep calm", "Avoid confrontation"],
            (Emotion::Angry, Language::Indonesian) => &["Tetap tenang", "Hindari konfrontasi"],
            (Emotion::Fearful, Language::English) => {
                &["Speak softly", "Explain what's happening"]
            }
            (Emotion::Fearful, Language::Indonesian) => {
                &["Bicara dengan lembut", "Jelaskan apa yang terjadi"]
            }
            (Emotion::Surprised, _) | (Emotion::Neutral, _) => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmotionStrength {
    emotion: Emotion,
    strength: usize,
}

/// Social awareness: infers the dominant emotion and offers guidance
pub struct EmotionMode;

impl EmotionMode {
    /// Keyword hits per emotion, in enumeration order
    fn score(tokens: &[String]) -> Vec<EmotionStrength> {
        Emotion::ALL
            .iter()
            .map(|emotion| EmotionStrength {
                emotion: *emotion,
                strength: count_keywords(tokens, emotion.keywords()),
            })
            .collect()
    }

    /// Strictly highest score wins; earlier categories win ties; neutral when nothing scored
    fn dominant(scores: &[EmotionStrength]) -> (Emotion, usize) {
        let mut best = (Emotion::Neutral, 0);
        for score in scores {
            if score.strength > best.1 {
                best = (score.emotion, score.strength);
            }
        }
        best
    }
}

impl ModeHandler for EmotionMode {
    fn descriptor(&self) -> ModeDescriptor {
        ModeDescriptor {
            mode: Mode::Emotion,
            prompt: "<CAPTION>",
            description: "Detects emotions from facial expressions and provides social guidance",
        }
    }

    fn process(&self, raw_output: &str, language: Language) -> Result<ModeOutput, PostProcessError> {
        let text = extract_payload(raw_output, self.prompt())?;
        let tokens = words(&text);

        let scores = Self::score(&tokens);
        let (emotion, hits) = Self::dominant(&scores);

        let mut detected: Vec<EmotionStrength> =
            scores.into_iter().filter(|s| s.strength > 0).collect();
        detected.sort_by(|a, b| b.strength.cmp(&a.strength));

        let output_text = format!("{}. {}", emotion.label(language), emotion.advice(language));

        let mut metadata = Metadata::new();
        metadata.insert("detected_emotion".to_string(), json!(emotion));
        metadata.insert("all_detected".to_string(), json!(detected));

        Ok(ModeOutput {
            text: output_text,
            confidence: calculate_confidence(&text, hits),
            raw_output: raw_output.to_string(),
            metadata,
            suggestions: emotion
                .suggestions(language)
                .iter()
                .map(|s| s.to_string())
                .collect(),
            translatable: false,
        })
    }
}
