// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! LibreTranslate-compatible HTTP translator

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{TranslationError, Translator};
use crate::modes::Language;

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'static str,
    target: &'static str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

pub struct LibreTranslateClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl LibreTranslateClient {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TranslationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::ApiError {
                status: 0,
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    fn build_request<'a>(
        &'a self,
        text: &'a str,
        source: Language,
        target: Language,
    ) -> TranslateRequest<'a> {
        TranslateRequest {
            q: text,
            source: source.code(),
            target: target.code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        }
    }
}

#[async_trait]
impl Translator for LibreTranslateClient {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError> {
        if source == target {
            return Ok(text.to_string());
        }

        let response = self
            .client
            .post(format!("{}/translate", self.endpoint))
            .json(&self.build_request(text, source, target))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslationError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    TranslationError::ApiError {
                        status: 0,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();

        if status == 400 {
            return Err(TranslationError::UnsupportedLanguage {
                source_lang: source.code().to_string(),
                target: target.code().to_string(),
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let data: TranslateResponse =
            response
                .json()
                .await
                .map_err(|e| TranslationError::ApiError {
                    status: 0,
                    message: format!("JSON parse error: {}", e),
                })?;

        debug!(target_lang = %target, chars = data.translated_text.len(), "translated");

        if data.translated_text.trim().is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        Ok(data.translated_text)
    }

    fn name(&self) -> &'static str {
        "libretranslate"
    }
}
