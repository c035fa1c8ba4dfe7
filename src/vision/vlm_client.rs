// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! VLM sidecar client speaking the OpenAI-compatible chat API

use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::backend::{InferenceBackend, InferenceError};
use super::image_utils::encode_png_base64;

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: String,
}

const OCR_PROMPT: &str = "Extract all text from this image. Return only the extracted text, preserving the original layout and formatting as much as possible. If no text is found, respond with an empty string.";

const CAPTION_PROMPT: &str =
    "Describe this image in one sentence, including the facial expression of any person.";

const DETAILED_CAPTION_PROMPT: &str = "Describe this image in detail, including objects, people, their positions, and anything that could be a hazard for someone walking through it.";

/// Instruction text for a task token; other prompts are sent verbatim
fn instruction_for(task: &str) -> &str {
    match task {
        "<OCR>" => OCR_PROMPT,
        "<CAPTION>" => CAPTION_PROMPT,
        "<MORE_DETAILED_CAPTION>" | "<DETAILED_CAPTION>" => DETAILED_CAPTION_PROMPT,
        other => other,
    }
}

/// Inference backend backed by a VLM sidecar
pub struct VlmClient {
    client: Client,
    endpoint: String,
    model_name: String,
    max_tokens: u32,
}

impl VlmClient {
    pub fn new(
        endpoint: &str,
        model_name: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "VLM client configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
            max_tokens,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn build_request(&self, base64_png: &str, task: &str) -> ChatRequest {
        let data_url = format!("data:image/png;base64,{}", base64_png);
        ChatRequest {
            model: self.model_name.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: serde_json::json!([
                    {"type": "text", "text": instruction_for(task)},
                    {"type": "image_url", "image_url": {"url": data_url}}
                ]),
            }],
            max_tokens: self.max_tokens,
            temperature: 0.1,
        }
    }
}

#[async_trait]
impl InferenceBackend for VlmClient {
    async fn infer(&self, image: &DynamicImage, prompt: &str) -> Result<String, InferenceError> {
        let start = Instant::now();
        let encoded = encode_png_base64(image).map_err(|e| InferenceError::Image(e.to_string()))?;
        let request = self.build_request(&encoded, prompt);

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        let tokens_used = chat_response.usage.map(|u| u.total_tokens).unwrap_or(0);
        let text = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| InferenceError::MalformedResponse("no choices in response".into()))?;

        debug!(
            task = prompt,
            elapsed_ms = start.elapsed().as_millis() as u64,
            tokens_used,
            "VLM inference complete"
        );
        Ok(text)
    }

    fn name(&self) -> String {
        format!("vlm:{}", self.model_name)
    }
}
