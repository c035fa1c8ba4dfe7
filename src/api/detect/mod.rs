// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection API endpoint module
//!
//! Provides POST /v1/detect and POST /v1/detect/all.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{detect_all_handler, detect_handler};
pub use request::{DetectAllRequest, DetectRequest};
pub use response::{DetectAllResponse, ModeOutcome};
