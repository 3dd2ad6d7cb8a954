//! Error handling for smartfwd-store
//!
//! Wraps smartfwd-core FwdError with store-specific helpers

use smartfwd_core::errors::{FwdError, FwdErrorKind};

/// Result type alias using FwdError
pub type Result<T> = std::result::Result<T, FwdError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> FwdError {
    FwdError::new(FwdErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> FwdError {
    FwdError::new(FwdErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create an error for a stored row that no longer decodes
pub fn corrupt_row(table: &str, reason: &str) -> FwdError {
    FwdError::new(FwdErrorKind::Persistence)
        .with_op("decode_row")
        .with_message(format!("Corrupt row in {}: {}", table, reason))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> FwdError {
    FwdError::new(FwdErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an error for a poisoned connection lock
pub fn lock_poisoned() -> FwdError {
    FwdError::new(FwdErrorKind::Internal)
        .with_op("sqlite_lock")
        .with_message("connection lock poisoned")
}
