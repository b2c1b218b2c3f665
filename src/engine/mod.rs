use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::explain;
use crate::lang::Language;
use crate::log::ArtifactLog;
use crate::parse;
use crate::prompt;
use crate::provider::{DynProvider, Provider};
use crate::session::Session;
use crate::ux;
use crate::validate;
use crate::wire::ChatRequest;

pub const FIX_UNAVAILABLE: &str =
    "Unable to suggest a fix. Please check the error message and code for typos or missing components.";
pub const FIX_FAILED: &str =
    "Unable to suggest a fix due to an error. Please check the error message and code manually.";

/// Model id and sampling limits for one call.
#[derive(Debug, Clone)]
pub struct Sampling {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub modified_code: String,
    pub explanation: String,
    pub used_fallback: bool,
    pub request: ChatRequest,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FixProposal {
    pub suggestion: String,
    pub updated_code: String,
    pub request: ChatRequest,
    pub raw: String,
}

/// Replay the whole history against the original code and parse the reply.
/// Touches no session state; transport errors are returned as-is.
pub async fn generate_code_modification(
    provider: &dyn Provider,
    original_code: &str,
    history: &[String],
    context: &str,
    lang: Language,
    sampling: &Sampling,
) -> Result<Generation> {
    let instruction = prompt::generate_instruction(lang, original_code, history, context);
    let request = ChatRequest::new(&sampling.model, &instruction, sampling.temperature, sampling.max_tokens);

    let raw = provider.complete(&request).await?;
    debug!(raw = %raw, "raw model response for code modification");

    let parsed = parse::parse_generation(&raw, &lang.fence_tag());
    let used_fallback = explain::needs_fallback(&parsed.explanation);
    let explanation = if used_fallback {
        explain::fallback_explanation(original_code, &parsed.code, history, lang)
    } else {
        parsed.explanation
    };

    Ok(Generation {
        modified_code: parsed.code,
        explanation,
        used_fallback,
        request,
        raw,
    })
}

/// Single-shot fix: missing sections fall back to a canned suggestion and the input code.
pub async fn suggest_error_fix(
    provider: &dyn Provider,
    error_message: &str,
    code: &str,
    lang: Language,
    sampling: &Sampling,
) -> Result<FixProposal> {
    let instruction = prompt::fix_instruction(lang, error_message, code);
    let request = ChatRequest::new(&sampling.model, &instruction, sampling.temperature, sampling.max_tokens);

    let raw = provider.complete(&request).await?;
    debug!(raw = %raw, "raw model response for error fix");

    let suggestion = parse::fix_suggestion(&raw).unwrap_or_else(|| FIX_UNAVAILABLE.to_string());
    let updated_code = parse::fenced_block(&raw, &lang.fence_tag()).unwrap_or_else(|| code.to_string());

    Ok(FixProposal { suggestion, updated_code, request, raw })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOutcome {
    pub first_generation: bool,
    pub used_fallback: bool,
}

/// Drives the orchestrators against a [`Session`] and applies the commit rules.
pub struct Engine {
    provider: DynProvider,
    cfg: Config,
    artifacts: Option<ArtifactLog>,
}

impl Engine {
    pub fn new(provider: DynProvider, cfg: Config) -> Self {
        let artifacts = cfg
            .save_artifacts
            .then(|| ArtifactLog::new(cfg.artifacts_dir.clone()));
        Self { provider, cfg, artifacts }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn sampling(&self, session: &Session, max_tokens: u32) -> Sampling {
        Sampling {
            model: session.model.clone(),
            temperature: self.cfg.temperature,
            max_tokens,
        }
    }

    fn record(&self, stage: &str, req: &ChatRequest, raw: &str, session: &Session) {
        if let Some(log) = &self.artifacts {
            match log.save_stage(stage, req, raw, session) {
                Ok(saved) => debug!(
                    dir = %saved.dir.display(),
                    request = %saved.request.display(),
                    response = %saved.response.display(),
                    "saved {stage} artifacts"
                ),
                Err(e) => warn!("could not save {stage} artifacts: {e:#}"),
            }
        }
    }

    /// Append `prompt`, regenerate from the original code, and commit if the
    /// result validates. A transport failure rolls back the appended prompt and
    /// an original captured by this call; a validation failure keeps both so
    /// the prompt can be edited.
    pub async fn generate(
        &self,
        session: &mut Session,
        code_input: &str,
        prompt: &str,
        context: &str,
    ) -> Result<GenerateOutcome, AppError> {
        if code_input.trim().is_empty() || prompt.trim().is_empty() {
            return Err(AppError::Input(
                "Provide both game code and a change description before generating.".into(),
            ));
        }

        let seeded = session.seed_original(code_input);
        if seeded {
            info!(session = %session.id, "original code captured");
        }
        let previous_len = session.prompt_history.len();
        session.push_prompt(prompt.trim());

        let sampling = self.sampling(session, self.cfg.generate_max_tokens);
        let spinner = ux::spinner(self.cfg.progress, "Generating suggestions...");
        let result = generate_code_modification(
            &*self.provider,
            &session.original_code,
            &session.prompt_history,
            context,
            session.language,
            &sampling,
        )
        .await;
        ux::finish_spinner(spinner);

        let generation = match result {
            Ok(g) => g,
            Err(e) => {
                warn!("generation failed, rolling back prompt: {e:#}");
                session.truncate_history(previous_len);
                if seeded {
                    session.original_code.clear();
                }
                return Err(AppError::generation("Error generating suggestions", e));
            }
        };
        if generation.used_fallback {
            info!("model explanation missing or short; using fallback explanation");
        }

        let (ok, message) = validate::validate_code(&generation.modified_code, session.language);
        if !ok {
            self.record("generate", &generation.request, &generation.raw, session);
            return Err(AppError::Validation(message));
        }

        session.commit_generation(generation.modified_code, generation.explanation);
        self.record("generate", &generation.request, &generation.raw, session);
        info!(steps = session.prompt_history.len(), "generation committed");

        Ok(GenerateOutcome {
            first_generation: previous_len == 0,
            used_fallback: generation.used_fallback,
        })
    }

    /// Ask for a fix of the integrated code. On transport failure the session
    /// records a generic suggestion and keeps the integrated code.
    pub async fn suggest_fix(&self, session: &mut Session, error_message: &str) -> Result<(), AppError> {
        if session.integrated_code.is_empty() {
            return Err(AppError::Input("Integrate generated code before asking for a fix.".into()));
        }
        if error_message.trim().is_empty() {
            return Err(AppError::Input("Paste the error message to get a fix.".into()));
        }
        session.error_message = error_message.to_string();

        let sampling = self.sampling(session, self.cfg.fix_max_tokens);
        let spinner = ux::spinner(self.cfg.progress, "Analyzing error...");
        let result = suggest_error_fix(
            &*self.provider,
            error_message,
            &session.integrated_code,
            session.language,
            &sampling,
        )
        .await;
        ux::finish_spinner(spinner);

        match result {
            Ok(fix) => {
                session.apply_fix(fix.suggestion, fix.updated_code);
                self.record("fix", &fix.request, &fix.raw, session);
                info!("fix applied to integrated code");
                Ok(())
            }
            Err(e) => {
                warn!("fix request failed: {e:#}");
                session.error_fix_suggestion = FIX_FAILED.to_string();
                session.error_updated_code = session.integrated_code.clone();
                Err(AppError::generation("Error suggesting fix", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Replays canned replies in order and records every request.
    #[derive(Clone, Default)]
    struct Scripted {
        replies: Arc<Mutex<Vec<Result<String, String>>>>,
        seen: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            let mut r: Vec<Result<String, String>> = replies
                .into_iter()
                .map(|x| x.map(str::to_string).map_err(str::to_string))
                .collect();
            r.reverse();
            Self { replies: Arc::new(Mutex::new(r)), seen: Arc::default() }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for Scripted {
        async fn complete(&self, req: &ChatRequest) -> Result<String> {
            self.seen.lock().unwrap().push(req.clone());
            match self.replies.lock().unwrap().pop() {
                Some(Ok(s)) => Ok(s),
                Some(Err(e)) => Err(anyhow!(e)),
                None => Err(anyhow!("no scripted reply left")),
            }
        }
    }

    fn engine(p: &Scripted) -> Engine {
        let cfg = Config { progress: false, ..Config::default() };
        Engine::new(Box::new(p.clone()), cfg)
    }

    fn sampling() -> Sampling {
        Sampling { model: "m".into(), temperature: 0.7, max_tokens: 1500 }
    }

    const LONG_EXPLANATION: &str = "**Explanation**:\n- a\n- b\n- c\n- d\n- e";

    #[tokio::test]
    async fn parses_code_and_keeps_long_explanation() {
        let reply = format!("```python\nimport pygame\n```\n{LONG_EXPLANATION}");
        let p = Scripted::new(vec![Ok(reply.as_str())]);
        let g = generate_code_modification(&p, "import os", &["Add jump".to_string()], "", Language::Python, &sampling())
            .await
            .unwrap();
        assert_eq!(g.modified_code, "import pygame");
        assert_eq!(g.explanation, "- a\n- b\n- c\n- d\n- e");
        assert!(!g.used_fallback);
        assert_eq!(p.requests()[0].max_tokens, 1500);
    }

    #[tokio::test]
    async fn short_explanation_is_replaced() {
        let p = Scripted::new(vec![Ok("```python\ndef jump(): pass\n```\n**Explanation**: short")]);
        let g = generate_code_modification(&p, "", &["Add jump mechanic".to_string()], "", Language::Python, &sampling())
            .await
            .unwrap();
        assert!(g.used_fallback);
        assert!(g.explanation.starts_with("### Key Changes Made:"));
    }

    #[tokio::test]
    async fn request_replays_full_history_against_original() {
        let reply = format!("```lua\nlocal v = 2\n```\n{LONG_EXPLANATION}");
        let p = Scripted::new(vec![Ok(reply.as_str()), Ok(reply.as_str())]);
        let e = engine(&p);
        let mut s = Session::new(Language::Lua, "llama-3.3-70b-versatile");

        e.generate(&mut s, "local v = 1", "p1", "").await.unwrap();
        e.generate(&mut s, "local v = 1", "p2", "").await.unwrap();

        let reqs = p.requests();
        let user = &reqs[1].messages[1].content;
        let s1 = user.find("Step 1: p1").unwrap();
        let s2 = user.find("Step 2: p2").unwrap();
        assert!(s1 < s2);
        assert!(user.contains("```lua\nlocal v = 1\n```"));
        assert!(!user.contains("local v = 2"));
        assert_eq!(reqs[1].model, "llama-3.3-70b-versatile");
    }

    #[tokio::test]
    async fn missing_fence_fails_validation_without_commit() {
        let p = Scripted::new(vec![Ok("Sure! I added a jump.")]);
        let e = engine(&p);
        let mut s = Session::new(Language::Python, "m");

        let err = e.generate(&mut s, "def main(): pass", "Add jump mechanic", "").await.unwrap_err();
        match err {
            AppError::Validation(msg) => assert_eq!(msg, "Error: Code input is empty."),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(s.modified_code, "");
        assert_eq!(s.prompt_history, vec!["Add jump mechanic".to_string()]);
    }

    #[tokio::test]
    async fn transport_failure_rolls_back_prompt() {
        let reply = format!("```rust\nfn main() {{}}\n```\n{LONG_EXPLANATION}");
        let p = Scripted::new(vec![Ok(reply.as_str()), Err("connection reset")]);
        let e = engine(&p);
        let mut s = Session::new(Language::Rust, "m");

        e.generate(&mut s, "fn main() {}", "p1", "").await.unwrap();
        let err = e.generate(&mut s, "fn main() {}", "p2", "").await.unwrap_err();

        assert!(matches!(err, AppError::Generation { .. }));
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(s.prompt_history, vec!["p1".to_string()]);
        assert_eq!(s.modified_code, "fn main() {}");
    }

    #[tokio::test]
    async fn failed_first_generation_releases_original() {
        let reply = format!("```python\ndef real_game(): pass\n```\n{LONG_EXPLANATION}");
        let p = Scripted::new(vec![Err("401 unauthorized"), Ok(reply.as_str())]);
        let e = engine(&p);
        let mut s = Session::new(Language::Python, "m");

        assert!(e.generate(&mut s, "def wrong_paste(): pass", "p1", "").await.is_err());
        assert!(s.prompt_history.is_empty());
        assert_eq!(s.original_code, "");

        e.generate(&mut s, "def real_game(): pass", "p1", "").await.unwrap();
        assert_eq!(s.original_code, "def real_game(): pass");
        let user = &p.requests()[1].messages[1].content;
        assert!(user.contains("def real_game(): pass"));
        assert!(!user.contains("wrong_paste"));
    }

    #[tokio::test]
    async fn blank_inputs_skip_the_model() {
        let p = Scripted::new(vec![]);
        let e = engine(&p);
        let mut s = Session::new(Language::Rust, "m");
        assert!(matches!(e.generate(&mut s, "  ", "p", "").await, Err(AppError::Input(_))));
        assert!(matches!(e.generate(&mut s, "fn a() {}", "", "").await, Err(AppError::Input(_))));
        assert!(p.requests().is_empty());
        assert!(s.original_code.is_empty());
    }

    #[tokio::test]
    async fn first_generation_is_flagged() {
        let reply = format!("```rust\nfn main() {{}}\n```\n{LONG_EXPLANATION}");
        let p = Scripted::new(vec![Ok(reply.as_str()), Ok(reply.as_str())]);
        let e = engine(&p);
        let mut s = Session::new(Language::Rust, "m");
        assert!(e.generate(&mut s, "fn main() {}", "p1", "").await.unwrap().first_generation);
        assert!(!e.generate(&mut s, "fn main() {}", "p2", "").await.unwrap().first_generation);
    }

    #[tokio::test]
    async fn fix_without_updated_code_keeps_input() {
        let p = Scripted::new(vec![Ok("**Suggested Fix**: Add a semicolon.")]);
        let fix = suggest_error_fix(&p, "expected ';'", "int x = 1", Language::Cpp, &sampling())
            .await
            .unwrap();
        assert_eq!(fix.updated_code, "int x = 1");
        assert_eq!(fix.suggestion, FIX_UNAVAILABLE);
    }

    #[tokio::test]
    async fn fix_parses_both_sections() {
        let p = Scripted::new(vec![Ok(
            "**Suggested Fix**: Use std::cout.\n**Updated Code**:\n```c++\nstd::cout << hp;\n```",
        )]);
        let fix = suggest_error_fix(&p, "cout undeclared", "cout << hp;", Language::Cpp, &sampling())
            .await
            .unwrap();
        assert_eq!(fix.suggestion, "Use std::cout.");
        assert_eq!(fix.updated_code, "std::cout << hp;");
    }

    #[tokio::test]
    async fn fix_updates_integrated_code() {
        let p = Scripted::new(vec![Ok(
            "**Suggested Fix**: Declare it.\n**Updated Code**:\n```lua\nlocal hp = 100\n```",
        )]);
        let e = engine(&p);
        let mut s = Session::new(Language::Lua, "m");
        s.integrated_code = "hp = 100".into();

        e.suggest_fix(&mut s, "attempt to index nil").await.unwrap();
        assert_eq!(s.integrated_code, "local hp = 100");
        assert_eq!(s.error_updated_code, "local hp = 100");
        assert_eq!(s.error_fix_suggestion, "Declare it.");
        assert_eq!(s.error_message, "attempt to index nil");
        assert_eq!(p.requests()[0].max_tokens, 1000);
    }

    #[tokio::test]
    async fn fix_transport_failure_records_generic_suggestion() {
        let p = Scripted::new(vec![Err("timeout")]);
        let e = engine(&p);
        let mut s = Session::new(Language::Lua, "m");
        s.integrated_code = "hp = 100".into();

        assert!(e.suggest_fix(&mut s, "boom").await.is_err());
        assert_eq!(s.error_fix_suggestion, FIX_FAILED);
        assert_eq!(s.error_updated_code, "hp = 100");
        assert_eq!(s.integrated_code, "hp = 100");
    }

    #[tokio::test]
    async fn fix_requires_integrated_code() {
        let p = Scripted::new(vec![]);
        let e = engine(&p);
        let mut s = Session::new(Language::Lua, "m");
        assert!(matches!(e.suggest_fix(&mut s, "boom").await, Err(AppError::Input(_))));
    }

    #[tokio::test]
    async fn artifacts_are_written_when_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        let reply = format!("```rust\nfn main() {{}}\n```\n{LONG_EXPLANATION}");
        let p = Scripted::new(vec![Ok(reply.as_str())]);
        let cfg = Config {
            progress: false,
            save_artifacts: true,
            artifacts_dir: tmp.path().to_string_lossy().to_string(),
            ..Config::default()
        };
        let e = Engine::new(Box::new(p.clone()), cfg);
        let mut s = Session::new(Language::Rust, "m");
        e.generate(&mut s, "fn main() {}", "p1", "").await.unwrap();

        let dir = tmp.path().join("sessions").join(s.id.to_string());
        assert!(dir.join("001-generate.request.json").exists());
        assert!(dir.join("session.json").exists());
    }
}
