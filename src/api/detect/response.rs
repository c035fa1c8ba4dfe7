// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection response types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::modes::{DetectionResult, Mode};

/// Result of one mode inside a detect-all response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeOutcome {
    Success(DetectionResult),
    Failure { error: String },
}

impl From<Result<DetectionResult, String>> for ModeOutcome {
    fn from(outcome: Result<DetectionResult, String>) -> Self {
        match outcome {
            Ok(result) => ModeOutcome::Success(result),
            Err(error) => ModeOutcome::Failure { error },
        }
    }
}

/// Response of POST /v1/detect/all, keyed by mode identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectAllResponse {
    pub results: BTreeMap<Mode, ModeOutcome>,
    pub processing_time_ms: u64,
}

impl DetectAllResponse {
    pub fn new(
        results: BTreeMap<Mode, Result<DetectionResult, String>>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            results: results
                .into_iter()
                .map(|(mode, outcome)| (mode, outcome.into()))
                .collect(),
            processing_time_ms,
        }
    }

    pub fn failures(&self) -> usize {
        self.results
            .values()
            .filter(|o| matches!(o, ModeOutcome::Failure { .. }))
            .count()
    }
}
