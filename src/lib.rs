// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cache;
pub mod config;
pub mod modes;
pub mod orchestrator;
pub mod services;
pub mod vision;

pub use cache::{CacheStats, ResultCache};
pub use config::DaraConfig;
pub use modes::{DetectionResult, Language, Mode, ModeDescriptor};
pub use orchestrator::{DetectionError, DetectionRequest, Detector, ImageInput};
