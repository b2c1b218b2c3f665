use clap::Parser;
use fs_err as fs;
use std::io::{self, BufRead};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod engine;
mod errors;
mod explain;
mod lang;
mod log;
mod parse;
mod prompt;
mod provider;
mod session;
mod ux;
mod validate;
mod wire;

use crate::errors::AppError;

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Stdin echoes what is typed, so the label says so and names the quieter routes.
fn key_prompt_label(provider: cli::ProviderKind) -> String {
    match provider.key_env_var() {
        Some(var) => format!("{provider:?} API key (input is visible; prefer --api-key or {var}): "),
        None => format!("{provider:?} API key (input is visible; prefer --api-key): "),
    }
}

/// Build the provider, asking for a key on stdin until one passes the
/// format check or input ends.
fn connect(
    cfg: &config::Config,
    mut key: Option<String>,
    input: &mut impl BufRead,
) -> anyhow::Result<Option<provider::DynProvider>> {
    loop {
        match provider::make_provider(cfg, key.as_deref()) {
            Ok(p) => return Ok(Some(p)),
            Err(e @ AppError::CredentialFormat { .. }) => {
                if key.is_some() {
                    ux::print_error(&e);
                }
                match ux::read_line(&mut *input, &key_prompt_label(cfg.provider))? {
                    Some(k) if !k.trim().is_empty() => key = Some(k),
                    Some(_) => continue,
                    None => return Ok(None),
                }
            }
            Err(e) => {
                ux::print_error(&e);
                return Ok(None);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_tracing(args.debug);

    let cfg = config::Config::resolve(&args)?;
    info!(provider = ?cfg.provider, model = %cfg.model, language = %cfg.language, "configuration resolved");

    let stdin = io::stdin();
    let mut input = stdin.lock();

    let key = args
        .api_key
        .clone()
        .or_else(|| cfg.provider.key_env_var().and_then(|v| std::env::var(v).ok()));
    let Some(prov) = connect(&cfg, key, &mut input)? else {
        warn!("no usable API key; exiting");
        ux::print_error("A valid API key is required to proceed.");
        return Ok(());
    };

    let code_input = match &args.code {
        Some(path) => fs::read_to_string(path)?,
        None => String::new(),
    };

    let session = session::Session::new(cfg.language, cfg.model.clone());
    info!(session = %session.id, "session started");
    let engine = engine::Engine::new(prov, cfg);

    let mut repl = ux::Repl::new(engine, session, code_input, input);
    repl.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ProviderKind;

    #[test]
    fn key_prompt_warns_about_echo() {
        assert_eq!(
            key_prompt_label(ProviderKind::Groq),
            "Groq API key (input is visible; prefer --api-key or GROQ_API_KEY): "
        );
        assert!(key_prompt_label(ProviderKind::Ollama).contains("input is visible"));
    }
}
