//! Correlation types for tracking a single enable/disable run
//!
//! A run starts on the caller's thread and continues on a worker thread,
//! with platform callbacks arriving on yet another thread. The `RunId`
//! ties the log lines of all three together.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one enable or disable run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Generate a new time-ordered RunId (UUIDv7)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an existing identifier, e.g. one handed in by a caller
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which user action a run belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Enable,
    Disable,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Enable => "enable",
            RunKind::Disable => "disable",
        }
    }
}

/// Context carried from the caller into the worker thread
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    pub kind: RunKind,
}

impl RunContext {
    /// Create a context with a fresh RunId
    pub fn new(kind: RunKind) -> Self {
        Self {
            run_id: RunId::new(),
            kind,
        }
    }

    /// Create a context reusing an existing RunId
    pub fn with_run_id(kind: RunKind, run_id: RunId) -> Self {
        Self { run_id, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_generation() {
        let id1 = RunId::new();
        let id2 = RunId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_run_id_display() {
        let id = RunId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_run_context_keeps_supplied_id() {
        let id = RunId::from_string("run-1".to_string());
        let ctx = RunContext::with_run_id(RunKind::Disable, id.clone());
        assert_eq!(ctx.run_id, id);
        assert_eq!(ctx.kind.as_str(), "disable");
    }

    #[test]
    fn test_run_kind_serialization() {
        let json = serde_json::to_string(&RunKind::Enable).unwrap();
        assert_eq!(json, "\"enable\"");
        let back: RunKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RunKind::Enable);
    }
}
