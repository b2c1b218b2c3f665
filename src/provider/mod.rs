use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::AppError;
use crate::wire::ChatRequest;

pub mod anthropic;
pub mod ollama;
pub mod openai;

/// A chat-completion endpoint returning a single text completion.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, req: &ChatRequest) -> Result<String>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

/// Trim the key and enforce the provider's prefix.
pub fn check_api_key(kind: ProviderKind, raw: &str) -> Result<String, AppError> {
    let key = raw.trim().to_string();
    if let Some(prefix) = kind.key_prefix() {
        if !key.starts_with(prefix) {
            return Err(AppError::CredentialFormat { expected: prefix });
        }
    }
    Ok(key)
}

pub fn make_provider(cfg: &Config, api_key: Option<&str>) -> Result<DynProvider, AppError> {
    let key = match (cfg.provider.key_prefix(), api_key) {
        (None, _) => String::new(),
        (Some(_), Some(k)) => check_api_key(cfg.provider, k)?,
        (Some(prefix), None) => return Err(AppError::CredentialFormat { expected: prefix }),
    };

    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()
        .map_err(|e| AppError::ClientInit(e.to_string()))?;
    let base = cfg.api_base();

    Ok(match cfg.provider {
        ProviderKind::Groq | ProviderKind::OpenAI => {
            Box::new(openai::OpenAICompatible::new(client, base, key))
        }
        ProviderKind::Anthropic => Box::new(anthropic::Anthropic::new(client, base, key)),
        ProviderKind::Ollama => Box::new(ollama::Ollama::new(client, base)),
    })
}
