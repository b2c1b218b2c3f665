use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::{Args, ProviderKind};
use crate::lang::Language;

/// Models offered by the Groq endpoint; the first is the default.
pub const GROQ_MODELS: &[&str] = &[
    "llama-3.3-70b-versatile",
    "llama-3-70b-8192",
    "llama-3-8b-8192",
    "llama-3.1-70b-instruct",
    "llama-3.1-8b-instruct",
    "llama-4-scout",
    "llama-4-maverick",
    "mixtral-8x7b-32768",
    "gemma-7b-it",
    "qwen-2.5-32b",
    "deepseek-r1-distill-qwen-32b",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: String,
    pub language: Language,
    /// Overrides the provider's default endpoint when set.
    pub api_base: Option<String>,
    pub temperature: f32,
    pub generate_max_tokens: u32,
    pub fix_max_tokens: u32,
    pub timeout_secs: u64,
    pub save_artifacts: bool,
    pub artifacts_dir: String,
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Groq,
            model: GROQ_MODELS[0].into(),
            language: Language::Cpp,
            api_base: None,
            temperature: 0.7,
            generate_max_tokens: 1500,
            fix_max_tokens: 1000,
            timeout_secs: 120,
            save_artifacts: false,
            artifacts_dir: ".gci".into(),
            progress: true,
        }
    }
}

impl Config {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))
    }

    /// Defaults, then the optional TOML file, then command-line flags.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut cfg = match &args.config {
            Some(p) => Self::from_toml_file(Path::new(p))?,
            None => Self::default(),
        };

        if let Some(p) = args.provider {
            if p != cfg.provider && args.model.is_none() {
                cfg.model = default_model(p).into();
            }
            cfg.provider = p;
        }
        if let Some(m) = &args.model {
            cfg.model = m.clone();
        }
        // a file naming only a provider still carries the Groq default model
        if args.model.is_none() && cfg.provider != ProviderKind::Groq && cfg.model == default_model(ProviderKind::Groq) {
            cfg.model = default_model(cfg.provider).into();
        }
        if let Some(l) = args.language {
            cfg.language = l;
        }
        if let Some(b) = &args.api_base {
            cfg.api_base = Some(b.clone());
        }
        if let Some(t) = args.timeout_secs {
            cfg.timeout_secs = t;
        }
        cfg.save_artifacts |= args.save_artifacts;
        if args.no_progress {
            cfg.progress = false;
        }
        Ok(cfg)
    }

    pub fn api_base(&self) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| self.provider.default_api_base().to_string())
    }
}

pub fn default_model(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Groq => GROQ_MODELS[0],
        ProviderKind::OpenAI => "gpt-4.1-mini",
        ProviderKind::Anthropic => "claude-3-5-sonnet-latest",
        ProviderKind::Ollama => "llama3.1",
    }
}
