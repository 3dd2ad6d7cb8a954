//! Embedded SQL migrations

use sha2::{Digest, Sha256};

pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

impl Migration {
    /// Hex SHA-256 of the migration SQL, recorded in `schema_version`
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.sql.as_bytes()))
    }
}

/// Applied in slice order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        id: "001_slot_backups",
        sql: include_str!("../../migrations/001_slot_backups.sql"),
    },
    Migration {
        id: "002_feature_state",
        sql: include_str!("../../migrations/002_feature_state.sql"),
    },
];
