// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod http_server;

pub use detect::{detect_all_handler, detect_handler, DetectAllRequest, DetectRequest};
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{create_router, serve, AppState};
