//! Runtime configuration
//!
//! Defaults match the platform behaviour: a 20 second bound on a whole run
//! and a 3 second no-reply timer on the installed forwarding rule. Values
//! can come from a TOML file and be overridden from the environment.

use crate::errors::{Result, SmartFwdError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TASK_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_FORWARDING_TIMEOUT_SECONDS: u32 = 3;

/// Environment variable overriding `task_timeout_ms`
pub const ENV_TASK_TIMEOUT_MS: &str = "SMARTFWD_TASK_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartForwardingConfig {
    /// Bound on one enable/disable run and on each enable callback; the
    /// restores of a disable run share half of it
    pub task_timeout_ms: u64,
    /// Timer value sent with the forwarding rule
    pub forwarding_timeout_seconds: u32,
}

impl Default for SmartForwardingConfig {
    fn default() -> Self {
        Self {
            task_timeout_ms: DEFAULT_TASK_TIMEOUT_MS,
            forwarding_timeout_seconds: DEFAULT_FORWARDING_TIMEOUT_SECONDS,
        }
    }
}

impl SmartForwardingConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    /// Deadline for collecting the restores of a disable run
    ///
    /// Half the run bound, so a restore that never answers is counted as
    /// failed before the caller stops waiting.
    pub fn restore_wait_bound(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms / 2)
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: SmartForwardingConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| SmartFwdError::Io {
            op: format!("read config {}", path.display()),
            message: e.to_string(),
        })?;
        let cfg = Self::from_toml_str(&raw)?.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `SMARTFWD_*` environment overrides
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_TASK_TIMEOUT_MS) {
            self.task_timeout_ms =
                raw.trim()
                    .parse()
                    .map_err(|_| SmartFwdError::InvalidConfig {
                        reason: format!("{} must be an integer, got '{}'", ENV_TASK_TIMEOUT_MS, raw),
                    })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.task_timeout_ms == 0 {
            return Err(SmartFwdError::InvalidConfig {
                reason: "task_timeout_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
