use anyhow::Result;
use colored::Colorize;
use fs_err as fs;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::info;

use crate::cli::ProviderKind;
use crate::config::GROQ_MODELS;
use crate::engine::Engine;
use crate::lang::{self, Language};
use crate::prompt;
use crate::session::Session;

pub mod command;

use command::{parse_command, Command, HELP};

pub fn spinner(enabled: bool, msg: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub fn finish_spinner(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}

pub fn print_error(msg: impl std::fmt::Display) {
    println!("{} {}", "error:".red().bold(), msg);
}

pub fn print_info(msg: impl std::fmt::Display) {
    println!("{}", msg.to_string().dimmed());
}

fn heading(title: &str) {
    println!("\n{}", format!("=== {title} ===").bold());
}

fn print_code(code: &str, lang: Language) {
    println!("```{}", lang.fence_tag());
    println!("{code}");
    println!("```");
}

/// Read lines until a line holding only `.` or end of input.
pub fn read_block(input: &mut impl BufRead, prompt: &str) -> io::Result<Option<String>> {
    println!("{} {}", prompt.cyan(), "(finish with a line containing only '.')".dimmed());
    let mut lines = Vec::new();
    let mut saw_any = false;
    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        saw_any = true;
        let line = line.trim_end_matches(['\n', '\r']);
        if line == "." {
            break;
        }
        lines.push(line.to_string());
    }
    Ok(saw_any.then(|| lines.join("\n")))
}

pub fn read_line(input: &mut impl BufRead, prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

pub fn show_history(session: &Session) {
    heading("PROMPT HISTORY");
    if session.prompt_history.is_empty() {
        println!("No prompts yet. Type a change description to start.");
        return;
    }
    for (i, p) in session.prompt_history.iter().enumerate() {
        println!("{}  {}", format!("Step {}:", i + 1).yellow().bold(), p);
    }
}

pub fn show_suggestion(session: &Session) {
    if session.modified_code.is_empty() {
        println!("No suggestion yet.");
        return;
    }
    heading("SUGGESTED CODE");
    print_code(&session.modified_code, session.language);
    heading("DETAILED EXPLANATION OF CHANGES");
    println!("{}", session.explanation);
}

pub fn show_integrated(session: &Session) {
    heading("FINAL INTEGRATED CODE");
    print_code(&session.integrated_code, session.language);
    print_info("Test the integrated code in its environment. If it fails, use /fix with the error message.");
}

pub fn show_fix(session: &Session) {
    heading("SUGGESTED FIX");
    println!("{}", session.error_fix_suggestion);
    heading("UPDATED CODE AFTER FIX");
    print_code(&session.error_updated_code, session.language);
}

fn show_languages(current: Language) {
    for (i, l) in lang::ALL.iter().enumerate() {
        let marker = if *l == current { "*".green().bold() } else { " ".normal() };
        println!("{marker} {}. {}", i + 1, l.display_name());
    }
}

fn show_models(provider: ProviderKind, current: &str) {
    if provider != ProviderKind::Groq {
        println!("Current model: {} (any {:?} model id is accepted)", current.bold(), provider);
        return;
    }
    for (i, m) in GROQ_MODELS.iter().enumerate() {
        let marker = if *m == current { "*".green().bold() } else { " ".normal() };
        println!("{marker} {}. {}", i + 1, m);
    }
}

fn show_templates(lang: Language) {
    for (i, (name, _)) in prompt::TEMPLATES.iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }
    if let Some(example) = prompt::template(1, lang) {
        print_info(format!("e.g. /template 1 -> \"{example}\""));
    }
}

/// Resolve `/model` input: a 1-based index or id from the Groq list, or any id elsewhere.
pub fn select_model(provider: ProviderKind, arg: &str) -> Result<String, String> {
    if provider != ProviderKind::Groq {
        return Ok(arg.to_string());
    }
    if let Ok(n) = arg.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| GROQ_MODELS.get(i))
            .map(|m| m.to_string())
            .ok_or_else(|| format!("choose a model between 1 and {}", GROQ_MODELS.len()));
    }
    GROQ_MODELS
        .iter()
        .find(|m| **m == arg)
        .map(|m| m.to_string())
        .ok_or_else(|| format!("unknown model '{arg}' (see /models)"))
}

/// Interactive session over any line source.
pub struct Repl<R: BufRead> {
    engine: Engine,
    session: Session,
    code_input: String,
    context: String,
    input: R,
}

impl<R: BufRead> Repl<R> {
    pub fn new(engine: Engine, session: Session, code_input: String, input: R) -> Self {
        Self { engine, session, code_input, context: String::new(), input }
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("{}", "Game Code Iterator Assistant".bold());
        println!(
            "language: {}  model: {}  (type /help for commands)",
            self.session.language.display_name().cyan(),
            self.session.model.cyan()
        );
        if self.code_input.is_empty() {
            print_info("Start with /code or /load <path> to provide your game code.");
        }

        loop {
            let Some(line) = read_line(&mut self.input, &format!("{} ", "gci>".green().bold()))? else {
                break;
            };
            match parse_command(&line) {
                Ok(cmd) => {
                    if !self.handle(cmd).await? {
                        break;
                    }
                }
                Err(msg) => print_error(msg),
            }
        }
        Ok(())
    }

    /// Returns false when the session should end.
    async fn handle(&mut self, cmd: Command) -> Result<bool> {
        match cmd {
            Command::Nothing => {}
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(false),
            Command::Languages => show_languages(self.session.language),
            Command::Language(None) => println!("language: {}", self.session.language),
            Command::Language(Some(name)) => match name.parse::<Language>() {
                Ok(l) => {
                    self.session.language = l;
                    info!(language = %l, "language selected");
                    println!("language: {}", l.display_name().cyan());
                }
                Err(e) => print_error(e),
            },
            Command::Models => show_models(self.engine.config().provider, &self.session.model),
            Command::Model(arg) => match select_model(self.engine.config().provider, &arg) {
                Ok(m) => {
                    println!("model: {}", m.cyan());
                    self.session.model = m;
                }
                Err(e) => print_error(e),
            },
            Command::Code => {
                if let Some(code) = read_block(&mut self.input, "Paste your game code:")? {
                    self.code_input = code;
                    println!("code input: {} lines", self.code_input.lines().count());
                }
            }
            Command::Load(path) => match fs::read_to_string(&path) {
                Ok(code) => {
                    println!("code input: {} lines from {}", code.lines().count(), path);
                    self.code_input = code;
                }
                Err(e) => print_error(e),
            },
            Command::Context(text) => {
                self.context = text.unwrap_or_default();
                if self.context.is_empty() {
                    println!("context cleared");
                } else {
                    println!("context: {}", self.context);
                }
            }
            Command::Templates => show_templates(self.session.language),
            Command::Template(n) => match prompt::template(n, self.session.language) {
                Some(p) => self.generate(&p).await,
                None => print_error(format!("choose a template between 1 and {}", prompt::TEMPLATES.len())),
            },
            Command::Generate(p) => self.generate(&p).await,
            Command::History => show_history(&self.session),
            Command::Edit(n, text) => match self.session.edit_prompt(n, &text) {
                Ok(()) => show_history(&self.session),
                Err(e) => print_error(e),
            },
            Command::Delete(n) => match self.session.remove_prompt(n) {
                Ok(removed) => {
                    println!("removed: {removed}");
                    show_history(&self.session);
                }
                Err(e) => print_error(e),
            },
            Command::Show => {
                show_suggestion(&self.session);
                if !self.session.integrated_code.is_empty() {
                    show_integrated(&self.session);
                }
            }
            Command::Integrate => {
                if self.session.integrate() {
                    info!("integrated; prompt history cleared");
                    show_integrated(&self.session);
                } else {
                    print_error("Nothing to integrate yet. Generate a suggestion first.");
                }
            }
            Command::Fix => self.fix().await?,
            Command::Export(path) => match self.session.current_code() {
                Some(code) => match fs::write(&path, code) {
                    Ok(()) => println!("wrote {}", path),
                    Err(e) => print_error(e),
                },
                None => print_error("No code to export yet."),
            },
            Command::Reset => {
                self.session.reset();
                self.code_input.clear();
                self.context.clear();
                println!("new session {}", self.session.id);
            }
        }
        Ok(true)
    }

    async fn generate(&mut self, prompt: &str) {
        match self
            .engine
            .generate(&mut self.session, &self.code_input, prompt, &self.context)
            .await
        {
            Ok(outcome) => {
                if outcome.used_fallback {
                    print_info("(the model's explanation was thin; a generated summary is shown instead)");
                }
                show_suggestion(&self.session);
                if outcome.first_generation {
                    show_history(&self.session);
                }
            }
            Err(e) => print_error(e),
        }
    }

    async fn fix(&mut self) -> Result<()> {
        if self.session.integrated_code.is_empty() {
            print_error("Integrate generated code before asking for a fix.");
            return Ok(());
        }
        let Some(msg) = read_block(&mut self.input, "Paste the error message:")? else {
            return Ok(());
        };
        match self.engine.suggest_fix(&mut self.session, &msg).await {
            Ok(()) => show_fix(&self.session),
            Err(e) => {
                print_error(e);
                if !self.session.error_fix_suggestion.is_empty() {
                    show_fix(&self.session);
                }
            }
        }
        Ok(())
    }
}
