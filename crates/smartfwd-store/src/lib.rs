//! smartfwd store - SQLite persistence for smart-forwarding state
//!
//! Provides:
//! - SQLite schema with migrations framework
//! - `SqliteBackupStore`, the durable `BackupStore` implementation

pub mod backup_repo;
pub mod db;
pub mod errors;
pub mod migrations;

// Re-export key types
pub use backup_repo::SqliteBackupStore;
pub use errors::Result;
