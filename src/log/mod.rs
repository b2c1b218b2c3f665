use crate::session::Session;
use crate::wire::ChatRequest;
use fs_err as fs;
use serde_json::to_string_pretty;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Per-session debug artifacts: each model call's request and raw reply,
/// plus a snapshot of the session after the call. Numbering restarts at 001
/// in every session directory.
pub struct ArtifactLog {
    root: PathBuf,
    seq: Mutex<HashMap<Uuid, usize>>,
}

pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: PathBuf,
    pub response: PathBuf,
}

fn session_dir(root: &Path, id: Uuid) -> PathBuf {
    root.join("sessions").join(id.to_string())
}

impl ArtifactLog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), seq: Mutex::new(HashMap::new()) }
    }

    pub fn save_stage(
        &self,
        stage: &str,
        req: &ChatRequest,
        raw_response: &str,
        session: &Session,
    ) -> anyhow::Result<SavedPaths> {
        let dir = session_dir(&self.root, session.id);
        fs::create_dir_all(&dir)?;

        let n = {
            let mut seq = self.seq.lock().unwrap_or_else(|e| e.into_inner());
            let n = seq.entry(session.id).or_insert(0);
            *n += 1;
            *n
        };
        let request = dir.join(format!("{n:03}-{stage}.request.json"));
        fs::write(&request, to_string_pretty(req)?)?;
        let response = dir.join(format!("{n:03}-{stage}.response.md"));
        fs::write(&response, raw_response)?;
        fs::write(dir.join("session.json"), to_string_pretty(session)?)?;

        Ok(SavedPaths { dir, request, response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Language;
    use crate::wire::Instruction;

    #[test]
    fn writes_numbered_stage_files() {
        let tmp = tempfile::tempdir().unwrap();
        let log = ArtifactLog::new(tmp.path());
        let mut session = Session::new(Language::Rust, "m");
        session.diff_output = "-a\n+b".into();
        let req = ChatRequest::new("m", &Instruction { system: "s".into(), user: "u".into() }, 0.7, 10);

        let first = log.save_stage("generate", &req, "```rust\nfn a() {}\n```", &session).unwrap();
        let second = log.save_stage("fix", &req, "raw", &session).unwrap();

        assert!(first.request.ends_with("001-generate.request.json"));
        assert!(second.response.ends_with("002-fix.response.md"));
        assert_eq!(fs::read_to_string(&second.response).unwrap(), "raw");
        let snapshot = fs::read_to_string(first.dir.join("session.json")).unwrap();
        assert!(snapshot.contains("\"diff_output\": \"-a\\n+b\""));
    }

    #[test]
    fn numbering_restarts_per_session() {
        let tmp = tempfile::tempdir().unwrap();
        let log = ArtifactLog::new(tmp.path());
        let mut session = Session::new(Language::Lua, "m");
        let req = ChatRequest::new("m", &Instruction { system: "s".into(), user: "u".into() }, 0.7, 10);

        log.save_stage("generate", &req, "a", &session).unwrap();
        log.save_stage("generate", &req, "b", &session).unwrap();
        let old_id = session.id;
        session.reset();
        assert_ne!(session.id, old_id);

        let fresh = log.save_stage("generate", &req, "c", &session).unwrap();
        assert!(fresh.request.ends_with("001-generate.request.json"));
        assert!(tmp.path().join("sessions").join(old_id.to_string()).join("002-generate.response.md").exists());
    }
}
