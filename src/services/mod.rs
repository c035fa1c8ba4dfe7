// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Side services used after post-processing: translation and speech

pub mod translation;
pub mod tts;

pub use translation::{LibreTranslateClient, Translated, TranslationCache, TranslationError, Translator};
pub use tts::{AudioCache, AudioSynthesisError, EspeakSynthesizer, SpeechSynthesizer};
