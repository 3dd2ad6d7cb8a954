use crate::telephony::SubId;
use smartfwd_core_types::RunId;
use thiserror::Error;

/// Result type alias using SmartFwdError
pub type Result<T> = std::result::Result<T, SmartFwdError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in log events, CLI output
/// and tests. Codes never change once published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FwdErrorKind {
    // Input/Validation
    InvalidInput,
    InvalidConfig,

    // Preconditions
    ServiceUnavailable,
    ModemCountMismatch,
    SimNotActive,

    // Platform
    PlatformRejected,
    CallbackTimeout,
    CallbackDropped,

    // Task
    Timeout,
    WorkerFailed,

    // Integration/IO
    Persistence,
    Serialization,
    Io,

    // Internal
    Internal,
}

impl FwdErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            FwdErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            FwdErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            FwdErrorKind::ServiceUnavailable => "ERR_SERVICE_UNAVAILABLE",
            FwdErrorKind::ModemCountMismatch => "ERR_MODEM_COUNT_MISMATCH",
            FwdErrorKind::SimNotActive => "ERR_SIM_NOT_ACTIVE",
            FwdErrorKind::PlatformRejected => "ERR_PLATFORM_REJECTED",
            FwdErrorKind::CallbackTimeout => "ERR_CALLBACK_TIMEOUT",
            FwdErrorKind::CallbackDropped => "ERR_CALLBACK_DROPPED",
            FwdErrorKind::Timeout => "ERR_TIMEOUT",
            FwdErrorKind::WorkerFailed => "ERR_WORKER_FAILED",
            FwdErrorKind::Persistence => "ERR_PERSISTENCE",
            FwdErrorKind::Serialization => "ERR_SERIALIZATION",
            FwdErrorKind::Io => "ERR_IO",
            FwdErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus whatever telephony context was known
/// where the error was raised.
#[derive(Debug, Clone)]
pub struct FwdError {
    kind: FwdErrorKind,
    op: Option<String>,
    sub_id: Option<SubId>,
    slot: Option<usize>,
    step_index: Option<usize>,
    run_id: Option<RunId>,
    message: String,
    source: Option<Box<FwdError>>,
}

impl FwdError {
    pub fn new(kind: FwdErrorKind) -> Self {
        Self {
            kind,
            op: None,
            sub_id: None,
            slot: None,
            step_index: None,
            run_id: None,
            message: String::new(),
            source: None,
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_sub_id(mut self, sub_id: SubId) -> Self {
        self.sub_id = Some(sub_id);
        self
    }

    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn with_step_index(mut self, index: usize) -> Self {
        self.step_index = Some(index);
        self
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: FwdError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> FwdErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn sub_id(&self) -> Option<SubId> {
        self.sub_id
    }

    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub fn step_index(&self) -> Option<usize> {
        self.step_index
    }

    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&FwdError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for FwdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(slot) = self.slot {
            write!(f, " (slot: {})", slot)?;
        }
        if let Some(sub_id) = self.sub_id {
            write!(f, " (sub_id: {})", sub_id)?;
        }
        if let Some(index) = self.step_index {
            write!(f, " (step: {})", index)?;
        }
        Ok(())
    }
}

impl std::error::Error for FwdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for smart-forwarding operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmartFwdError {
    // ===== Preconditions =====
    /// A platform service could not be obtained
    #[error("{service} service is unavailable")]
    ServiceUnavailable { service: &'static str },

    /// The caller supplied a number list that doesn't cover every modem
    #[error("Expected {expected} forwarding numbers (one per active modem), got {actual}")]
    ModemCountMismatch { expected: usize, actual: usize },

    /// A slot has no usable subscription
    #[error("SIM in slot {slot} is not active (sub_id {sub_id})")]
    SimNotActive { slot: usize, sub_id: SubId },

    // ===== Platform =====
    /// The platform answered, but not with the expected result
    #[error("Platform rejected {op} for sub_id {sub_id}: {detail}")]
    PlatformRejected {
        op: &'static str,
        sub_id: SubId,
        detail: String,
    },

    /// The platform never invoked the completion callback
    #[error("No callback for {op} on sub_id {sub_id} within {timeout_ms} ms")]
    CallbackTimeout {
        op: &'static str,
        sub_id: SubId,
        timeout_ms: u64,
    },

    /// The platform dropped the completion callback without calling it
    #[error("Callback for {op} on sub_id {sub_id} was dropped without a result")]
    CallbackDropped { op: &'static str, sub_id: SubId },

    // ===== Task =====
    /// The bounding wait on a task expired
    #[error("{task} task did not finish within {timeout_ms} ms")]
    TaskTimeout { task: &'static str, timeout_ms: u64 },

    /// The worker thread could not be started or died without reporting
    #[error("{task} worker failed: {reason}")]
    WorkerFailed { task: &'static str, reason: String },

    // ===== Configuration / IO =====
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error during {op}: {message}")]
    Io { op: String, message: String },
}

impl SmartFwdError {
    /// Classification of this error in the canonical taxonomy
    pub fn kind(&self) -> FwdErrorKind {
        match self {
            SmartFwdError::ServiceUnavailable { .. } => FwdErrorKind::ServiceUnavailable,
            SmartFwdError::ModemCountMismatch { .. } => FwdErrorKind::ModemCountMismatch,
            SmartFwdError::SimNotActive { .. } => FwdErrorKind::SimNotActive,
            SmartFwdError::PlatformRejected { .. } => FwdErrorKind::PlatformRejected,
            SmartFwdError::CallbackTimeout { .. } => FwdErrorKind::CallbackTimeout,
            SmartFwdError::CallbackDropped { .. } => FwdErrorKind::CallbackDropped,
            SmartFwdError::TaskTimeout { .. } => FwdErrorKind::Timeout,
            SmartFwdError::WorkerFailed { .. } => FwdErrorKind::WorkerFailed,
            SmartFwdError::InvalidConfig { .. } => FwdErrorKind::InvalidConfig,
            SmartFwdError::Persistence { .. } => FwdErrorKind::Persistence,
            SmartFwdError::Serialization { .. } => FwdErrorKind::Serialization,
            SmartFwdError::Io { .. } => FwdErrorKind::Io,
        }
    }
}

/// Conversion from SmartFwdError to FwdError
impl From<SmartFwdError> for FwdError {
    fn from(err: SmartFwdError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        let base = FwdError::new(kind).with_message(message);
        match err {
            SmartFwdError::SimNotActive { slot, sub_id } => base
                .with_op("init")
                .with_slot(slot)
                .with_sub_id(sub_id),
            SmartFwdError::ModemCountMismatch { .. } | SmartFwdError::ServiceUnavailable { .. } => {
                base.with_op("init")
            }
            SmartFwdError::PlatformRejected { op, sub_id, .. }
            | SmartFwdError::CallbackTimeout { op, sub_id, .. }
            | SmartFwdError::CallbackDropped { op, sub_id } => {
                base.with_op(op).with_sub_id(sub_id)
            }
            SmartFwdError::TaskTimeout { task, .. } | SmartFwdError::WorkerFailed { task, .. } => {
                base.with_op(task)
            }
            SmartFwdError::Io { op, .. } => base.with_op(op),
            SmartFwdError::InvalidConfig { .. }
            | SmartFwdError::Persistence { .. }
            | SmartFwdError::Serialization { .. } => base,
        }
    }
}

impl From<serde_json::Error> for SmartFwdError {
    fn from(err: serde_json::Error) -> Self {
        SmartFwdError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SmartFwdError {
    fn from(err: toml::de::Error) -> Self {
        SmartFwdError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
