//! Tracing setup and the operation log macros
//!
//! Every enable/disable run, rollback pass and platform call logs through
//! `log_op_start!` / `log_op_end!` / `log_op_error!`, so each event carries
//! `component`, `op` and `event` fields. `init` installs the global
//! subscriber once per process; tests install a [`TestCapture`] layer
//! instead and assert on the recorded events.
//!
//! ```rust
//! use smartfwd_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
