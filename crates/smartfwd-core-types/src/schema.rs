//! Canonical schema constants for structured logging
//!
//! Every log event emitted by the flow uses these keys so that captured
//! output can be asserted on without string guessing.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";

// Telephony identifiers
pub const FIELD_SLOT: &str = "slot";
pub const FIELD_SUB_ID: &str = "sub_id";

// Step bookkeeping
pub const FIELD_STEP: &str = "step";
pub const FIELD_STEP_INDEX: &str = "step_index";
pub const FIELD_STEP_COUNT: &str = "step_count";
pub const FIELD_MODEM_COUNT: &str = "modem_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_STEP_FAILED: &str = "step_failed";
pub const EVENT_RESTORE: &str = "restore";
