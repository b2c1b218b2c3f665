use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::lang::Language;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    /// Required prefix for API keys of this provider, if any.
    pub fn key_prefix(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Groq => Some("gsk_"),
            ProviderKind::OpenAI => Some("sk-"),
            ProviderKind::Anthropic => Some("sk-ant-"),
            ProviderKind::Ollama => None,
        }
    }

    pub fn key_env_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::OpenAI => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "gci",
    version,
    about = "Game code iterator: replay edit prompts against your game code with an LLM"
)]
pub struct Args {
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, value_enum)]
    pub language: Option<Language>,

    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub api_base: Option<String>,

    /// Seed the code input from a file instead of pasting it.
    #[arg(long)]
    pub code: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, default_value_t = false)]
    pub save_artifacts: bool,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,

    #[arg(long)]
    pub config: Option<String>,
}
