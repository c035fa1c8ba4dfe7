// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scene description with hazard and navigation hints

use serde_json::json;

use super::text_utils::{calculate_confidence, extract_payload, matches_keyword, words};
use super::types::{Language, Metadata, Mode, ModeDescriptor, ModeOutput, PostProcessError};
use super::ModeHandler;

const MAX_HAZARDS: usize = 3;
const MAX_NAVIGATION_HINTS: usize = 3;

const HAZARD_KEYWORDS: &[&str] = &[
    "stairs", "step", "fire", "flame", "stove", "water", "pool", "edge", "cliff", "hole", "wet",
    "slippery", "sharp", "hot", "tangga", "api", "air", "tepi", "basah", "licin", "tajam",
    "panas",
];

const PEOPLE_KEYWORDS: &[&str] = &[
    "person", "people", "man", "men", "woman", "women", "child", "children", "group", "orang",
    "pria", "wanita", "anak", "kelompok",
];

struct NavigationCue {
    keywords: &'static [&'static str],
    hint_en: &'static str,
    hint_id: &'static str,
}

const NAVIGATION_CUES: &[NavigationCue] = &[
    NavigationCue {
        keywords: &["door", "pintu"],
        hint_en: "Door detected",
        hint_id: "Pintu terdeteksi",
    },
    NavigationCue {
        keywords: &["exit", "keluar"],
        hint_en: "Exit sign visible",
        hint_id: "Tanda keluar terlihat",
    },
    NavigationCue {
        keywords: &["left", "kiri"],
        hint_en: "Object on the left",
        hint_id: "Objek di kiri",
    },
    NavigationCue {
        keywords: &["right", "kanan"],
        hint_en: "Object on the right",
        hint_id: "Objek di kanan",
    },
    NavigationCue {
        keywords: &["table", "meja"],
        hint_en: "Table nearby",
        hint_id: "Meja di dekat Anda",
    },
    NavigationCue {
        keywords: &["chair", "kursi", "sofa"],
        hint_en: "Chair in scene",
        hint_id: "Kursi terlihat",
    },
];

/// Environmental awareness: describes the scene and flags hazards
pub struct SceneMode;

impl SceneMode {
    fn detect_hazards(words: &[String]) -> Vec<String> {
        HAZARD_KEYWORDS
            .iter()
            .filter(|kw| matches_keyword(words, kw))
            .take(MAX_HAZARDS)
            .map(|kw| kw.to_string())
            .collect()
    }

    fn navigation_hints(words: &[String], language: Language) -> Vec<String> {
        NAVIGATION_CUES
            .iter()
            .filter(|cue| cue.keywords.iter().any(|kw| matches_keyword(words, kw)))
            .take(MAX_NAVIGATION_HINTS)
            .map(|cue| match language {
                Language::English => cue.hint_en.to_string(),
                Language::Indonesian => cue.hint_id.to_string(),
            })
            .collect()
    }

    fn has_people(words: &[String]) -> bool {
        PEOPLE_KEYWORDS.iter().any(|kw| matches_keyword(words, kw))
    }

    fn hazard_warning(hazard: &str, language: Language) -> String {
        match language {
            Language::English => format!("Caution: {} detected", hazard),
            Language::Indonesian => format!("Awas: {} terdeteksi", hazard),
        }
    }
}

impl ModeHandler for SceneMode {
    fn descriptor(&self) -> ModeDescriptor {
        ModeDescriptor {
            mode: Mode::Scene,
            prompt: "<MORE_DETAILED_CAPTION>",
            description: "Describes the scene with objects, people, and spatial context",
        }
    }

    fn process(&self, raw_output: &str, language: Language) -> Result<ModeOutput, PostProcessError> {
        let text = extract_payload(raw_output, self.prompt())?;
        let tokens = words(&text);

        let hazards = Self::detect_hazards(&tokens);
        let hints = Self::navigation_hints(&tokens, language);

        let mut suggestions: Vec<String> = hazards
            .iter()
            .map(|h| Self::hazard_warning(h, language))
            .collect();
        suggestions.extend(hints.iter().cloned());

        let confidence = calculate_confidence(&text, hazards.len() + hints.len());

        let mut metadata = Metadata::new();
        metadata.insert("hazards_detected".to_string(), json!(hazards));
        metadata.insert("has_people".to_string(), json!(Self::has_people(&tokens)));

        Ok(ModeOutput {
            text,
            confidence,
            raw_output: raw_output.to_string(),
            metadata,
            suggestions,
            translatable: true,
        })
    }
}
