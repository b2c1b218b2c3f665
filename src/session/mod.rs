use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::lang::Language;

/// State of one interactive session. Nothing outlives the process.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub language: Language,
    pub model: String,
    /// Baseline every generation replays against; set once, on the first generation.
    pub original_code: String,
    pub prompt_history: Vec<String>,
    pub modified_code: String,
    pub explanation: String,
    pub integrated_code: String,
    /// Kept for artifacts only, never rendered.
    pub diff_output: String,
    pub error_message: String,
    pub error_fix_suggestion: String,
    pub error_updated_code: String,
}

impl Session {
    pub fn new(language: Language, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            language,
            model: model.into(),
            original_code: String::new(),
            prompt_history: Vec::new(),
            modified_code: String::new(),
            explanation: String::new(),
            integrated_code: String::new(),
            diff_output: String::new(),
            error_message: String::new(),
            error_fix_suggestion: String::new(),
            error_updated_code: String::new(),
        }
    }

    /// Fresh session with the same language and model selection.
    pub fn reset(&mut self) {
        *self = Session::new(self.language, std::mem::take(&mut self.model));
    }

    /// Adopt `code_input` as the original only before the first generation.
    pub fn seed_original(&mut self, code_input: &str) -> bool {
        if self.prompt_history.is_empty() && self.original_code.is_empty() {
            self.original_code = code_input.to_string();
            true
        } else {
            false
        }
    }

    pub fn push_prompt(&mut self, prompt: &str) {
        self.prompt_history.push(prompt.to_string());
    }

    /// Undo a `push_prompt` by restoring the pre-call history length.
    pub fn truncate_history(&mut self, len: usize) {
        self.prompt_history.truncate(len);
    }

    /// Replace prompt `step` (1-based, as displayed).
    pub fn edit_prompt(&mut self, step: usize, text: &str) -> Result<(), String> {
        match step.checked_sub(1) {
            Some(i) if i < self.prompt_history.len() => {
                self.prompt_history[i] = text.to_string();
                Ok(())
            }
            _ => Err(self.out_of_range(step)),
        }
    }

    /// Remove prompt `step` (1-based) and return it.
    pub fn remove_prompt(&mut self, step: usize) -> Result<String, String> {
        match step.checked_sub(1) {
            Some(i) if i < self.prompt_history.len() => Ok(self.prompt_history.remove(i)),
            _ => Err(self.out_of_range(step)),
        }
    }

    fn out_of_range(&self, step: usize) -> String {
        if self.prompt_history.is_empty() {
            format!("No step {step}: the prompt history is empty.")
        } else {
            format!("No step {step}: choose 1..={}.", self.prompt_history.len())
        }
    }

    pub fn commit_generation(&mut self, modified_code: String, explanation: String) {
        self.diff_output = compute_diff(&self.original_code, &modified_code);
        self.modified_code = modified_code;
        self.explanation = explanation;
    }

    /// Freeze the latest result and drop the history. Returns false when there is nothing to integrate.
    pub fn integrate(&mut self) -> bool {
        if self.modified_code.is_empty() {
            return false;
        }
        self.integrated_code = self.modified_code.clone();
        self.diff_output = compute_diff(&self.original_code, &self.integrated_code);
        self.prompt_history.clear();
        true
    }

    /// Record a fix result; the updated code becomes the integrated code.
    pub fn apply_fix(&mut self, suggestion: String, updated_code: String) {
        self.error_fix_suggestion = suggestion;
        self.error_updated_code = updated_code.clone();
        self.integrated_code = updated_code;
    }

    /// Code to export: integrated if present, else the latest generation.
    pub fn current_code(&self) -> Option<&str> {
        [&self.integrated_code, &self.modified_code]
            .into_iter()
            .find(|c| !c.is_empty())
            .map(|c| c.as_str())
    }
}

pub fn compute_diff(original: &str, modified: &str) -> String {
    let a: Vec<&str> = original.lines().collect();
    let b: Vec<&str> = modified.lines().collect();
    difflib::unified_diff(&a, &b, "original", "modified", "", "", 3)
        .into_iter()
        .map(|l| l.trim_end_matches('\n').to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(prompts: &[&str]) -> Session {
        let mut s = Session::new(Language::Python, "m");
        for p in prompts {
            s.push_prompt(p);
        }
        s
    }

    #[test]
    fn original_is_set_once() {
        let mut s = Session::new(Language::Python, "m");
        assert!(s.seed_original("def a(): pass"));
        s.push_prompt("p1");
        assert!(!s.seed_original("def b(): pass"));
        assert_eq!(s.original_code, "def a(): pass");
    }

    #[test]
    fn original_survives_integration() {
        let mut s = Session::new(Language::Python, "m");
        s.seed_original("def a(): pass");
        s.push_prompt("p1");
        s.commit_generation("def a(): return 1".into(), "e".into());
        assert!(s.integrate());
        // history is empty again, but the baseline stays
        assert!(!s.seed_original("other"));
        assert_eq!(s.original_code, "def a(): pass");
    }

    #[test]
    fn integrate_clears_history_and_snapshots_code() {
        let mut s = session_with(&["p1", "p2"]);
        s.commit_generation("import pygame".into(), "why".into());
        assert!(s.integrate());
        assert!(s.prompt_history.is_empty());
        assert_eq!(s.integrated_code, "import pygame");
    }

    #[test]
    fn integrate_without_result_is_refused() {
        let mut s = session_with(&["p1"]);
        assert!(!s.integrate());
        assert_eq!(s.prompt_history.len(), 1);
    }

    #[test]
    fn edit_and_remove_use_display_numbers() {
        let mut s = session_with(&["a", "b", "c"]);
        s.edit_prompt(2, "B").unwrap();
        assert_eq!(s.remove_prompt(1).unwrap(), "a");
        assert_eq!(s.prompt_history, vec!["B".to_string(), "c".to_string()]);
        assert!(s.edit_prompt(0, "x").is_err());
        assert!(s.remove_prompt(3).is_err());
    }

    #[test]
    fn truncate_restores_history() {
        let mut s = session_with(&["a"]);
        let before = s.prompt_history.len();
        s.push_prompt("b");
        s.truncate_history(before);
        assert_eq!(s.prompt_history, vec!["a".to_string()]);
    }

    #[test]
    fn fix_overwrites_integrated_code() {
        let mut s = session_with(&[]);
        s.integrated_code = "old".into();
        s.apply_fix("Rename it".into(), "new".into());
        assert_eq!(s.integrated_code, "new");
        assert_eq!(s.error_updated_code, "new");
        assert_eq!(s.current_code(), Some("new"));
    }

    #[test]
    fn reset_keeps_selection() {
        let mut s = session_with(&["a"]);
        let id = s.id;
        s.reset();
        assert_ne!(s.id, id);
        assert_eq!(s.language, Language::Python);
        assert_eq!(s.model, "m");
        assert!(s.prompt_history.is_empty());
    }

    #[test]
    fn diff_marks_changes() {
        let d = compute_diff("a\nb", "a\nc");
        assert!(d.contains("-b"));
        assert!(d.contains("+c"));
    }
}
