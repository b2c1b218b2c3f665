use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Provider;
use crate::wire::{ChatRequest, Role};

const API_VERSION: &str = "2023-06-01";

pub struct Anthropic {
    client: Client,
    api_base: String,
    api_key: String,
}

impl Anthropic {
    pub fn new(client: Client, api_base: String, api_key: String) -> Self {
        Self { client, api_base, api_key }
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Msg<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

/// The messages API takes the system prompt out of band.
fn to_body(req: &ChatRequest) -> MsgRequest<'_> {
    let messages = req
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| Msg {
            role: if m.role == Role::Assistant { "assistant" } else { "user" },
            content: &m.content,
        })
        .collect();
    MsgRequest {
        model: &req.model,
        max_tokens: req.max_tokens,
        temperature: req.temperature,
        messages,
        system: req.system_text(),
    }
}

#[async_trait]
impl Provider for Anthropic {
    async fn complete(&self, req: &ChatRequest) -> Result<String> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        debug!(%url, model = %req.model, "POST messages");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&to_body(req))
            .send()
            .await
            .context("anthropic request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("anthropic read body failed")?;
        debug!(%status, body = %text, "raw anthropic response");
        if !status.is_success() {
            return Err(anyhow!("anthropic API error ({}): {}", status, text));
        }

        let parsed: MsgResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("anthropic response parse error: {}", e))?;

        parsed
            .content
            .into_iter()
            .find(|b| b.r#type == "text" || !b.text.is_empty())
            .map(|b| b.text)
            .ok_or_else(|| anyhow!("anthropic: empty content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Instruction;

    #[test]
    fn system_prompt_moves_out_of_messages() {
        let ins = Instruction { system: "be terse".into(), user: "hi".into() };
        let req = ChatRequest::new("claude", &ins, 0.7, 1000);
        let v = serde_json::to_value(to_body(&req)).unwrap();
        assert_eq!(v["system"], "be terse");
        assert_eq!(v["messages"].as_array().unwrap().len(), 1);
        assert_eq!(v["messages"][0]["role"], "user");
        assert_eq!(v["max_tokens"], 1000);
    }
}
