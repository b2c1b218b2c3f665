use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Provider;
use crate::wire::{ChatMessage, ChatRequest};

/// Local Ollama server, no credentials.
pub struct Ollama {
    client: Client,
    url: String,
}

impl Ollama {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[derive(Serialize)]
struct OllamaChat<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: String,
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, req: &ChatRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let body = OllamaChat {
            model: &req.model,
            messages: &req.messages,
            stream: false,
            options: OllamaOptions {
                temperature: req.temperature,
                num_predict: req.max_tokens,
            },
        };
        debug!(%url, model = %req.model, "POST ollama chat");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("ollama request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("ollama read body failed")?;
        debug!(%status, body = %text, "raw ollama response");
        if !status.is_success() {
            return Err(anyhow!("ollama error ({}): {}", status, text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("ollama response parse error: {}", e))?;
        Ok(parsed.message.content)
    }
}
