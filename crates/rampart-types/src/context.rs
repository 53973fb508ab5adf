//! Per-session context consumed from collaborating layers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only session state supplied by the translator/UI layers with each
/// request: where to run, what environment to add, and what the user ran
/// recently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellContext {
    /// Identifier of the interactive session this request belongs to.
    pub session_id: Uuid,
    /// Working directory commands execute in.
    pub working_dir: PathBuf,
    /// Environment variables layered on top of the base OS environment.
    /// Values are never written to logs.
    pub env_overrides: BTreeMap<String, String>,
    /// Most-recent-first history of commands already run this session.
    pub history: Vec<String>,
}

impl ShellContext {
    /// A fresh context rooted at the given working directory.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            working_dir: working_dir.into(),
            env_overrides: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Add an environment override, builder-style.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(key.into(), value.into());
        self
    }
}

impl Default for ShellContext {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_unique_session() {
        let a = ShellContext::new("/tmp");
        let b = ShellContext::new("/tmp");
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn with_env_layers_overrides() {
        let ctx = ShellContext::new("/tmp")
            .with_env("FOO", "1")
            .with_env("BAR", "2");
        assert_eq!(ctx.env_overrides.get("FOO").map(String::as_str), Some("1"));
        assert_eq!(ctx.env_overrides.len(), 2);
    }
}
