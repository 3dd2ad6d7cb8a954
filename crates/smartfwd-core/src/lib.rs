//! smartfwd core - smart call-forwarding orchestration
//!
//! This crate turns a multi-SIM device's "smart forwarding" switch into an
//! ordered, reversible sequence of telephony commands:
//! - Query and update commands over a callback-style telephony API
//! - A flow controller that runs every query before any update and rolls
//!   back applied updates when a later step fails
//! - Enable/disable tasks bounded by a timeout on a dedicated worker
//! - Backup bookkeeping and the caller-side service that drives the tasks
//! - A simulated device for tests and the CLI

pub mod backup;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod errors;
pub mod flow;
pub mod logging_facility;
pub mod model;
pub mod service;
pub mod sim;
pub mod task;
pub mod telephony;

// Used by the logging macros so callers don't need a direct dependency
pub use smartfwd_core_types;

// Re-export commonly used types
pub use backup::{BackupStore, InMemoryBackupStore, SlotBackup};
pub use config::SmartForwardingConfig;
pub use errors::{FwdError, FwdErrorKind, Result, SmartFwdError};
pub use flow::{FlowController, RollbackReport, RunOutcome};
pub use model::{
    CallForwardingInfo, CallForwardingReason, CallWaitingStatus, FailureReason, FeatureResult,
    SlotUtData,
};
pub use service::{SmartForwardingService, UserNotice};
pub use task::{DisableSmartForwardingTask, DisableSummary, EnableSmartForwardingTask};
pub use telephony::{PlatformServices, SubId, SubscriptionService, TelephonyService};
