//! Core types shared across the smartfwd crates
//!
//! This crate holds the small vocabulary that both the error facility and
//! the logging facility depend on:
//!
//! - **Correlation types**: RunId, RunContext
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{RunContext, RunId, RunKind};
pub use sensitive::Sensitive;
