//! Canonical logging macros
//!
//! Every operation boundary (an enable run, a disable run, a rollback) is
//! logged with exactly one start event and one end or end_error event.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use smartfwd_core::log_op_start;
/// log_op_start!("enable_smart_forwarding");
/// log_op_start!("enable_smart_forwarding", modem_count = 2);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::smartfwd_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::smartfwd_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use smartfwd_core::log_op_end;
/// log_op_end!("enable_smart_forwarding", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::smartfwd_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::smartfwd_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Accepts anything convertible into `FwdError`.
///
/// # Example
///
/// ```
/// # use smartfwd_core::{log_op_error, errors::SmartFwdError};
/// let err = SmartFwdError::TaskTimeout { task: "enable", timeout_ms: 20_000 };
/// log_op_error!("enable_smart_forwarding", err, duration_ms = 20_000);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let fwd_err: $crate::errors::FwdError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::smartfwd_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?fwd_err.kind(),
            err.code = fwd_err.code(),
            detail = %fwd_err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let fwd_err: $crate::errors::FwdError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::smartfwd_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?fwd_err.kind(),
            err.code = fwd_err.code(),
            detail = %fwd_err,
            $($field)*
        );
    }};
}
