use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::wire::ChatRequest;

/// Any endpoint speaking the OpenAI `/chat/completions` dialect (Groq, OpenAI).
pub struct OpenAICompatible {
    client: Client,
    api_base: String,
    api_key: String,
}

impl OpenAICompatible {
    pub fn new(client: Client, api_base: String, api_key: String) -> Self {
        Self { client, api_base, api_key }
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

pub(crate) fn extract_content(text: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(text)
        .map_err(|e| anyhow!("failed to parse chat completion: {e}\nRaw: {text}"))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("chat completion had no choices"))
}

#[async_trait]
impl super::Provider for OpenAICompatible {
    async fn complete(&self, req: &ChatRequest) -> Result<String> {
        let url = self.url();
        debug!(%url, model = %req.model, "POST chat completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("chat completion read body failed")?;
        debug!(%status, body = %text, "raw chat completion response");

        if !status.is_success() {
            return Err(anyhow!("API error ({}): {}", status, text));
        }
        extract_content(&text)
    }
}
