//! SQLite-backed `BackupStore`
//!
//! One row per subscription in `slot_backups`; the enabled flag and the
//! per-slot numbers live in `feature_state` under the keys `enabled` and
//! `number.<slot>`.

use crate::db;
use crate::errors::{corrupt_row, from_rusqlite, lock_poisoned, Result};
use crate::migrations::apply_migrations;
use rusqlite::{Connection, OptionalExtension};
use smartfwd_core::backup::{BackupStore, SlotBackup};
use smartfwd_core::model::{CallForwardingInfo, CallForwardingReason};
use smartfwd_core::smartfwd_core_types::Sensitive;
use smartfwd_core::SubId;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const KEY_ENABLED: &str = "enabled";

fn number_key(slot: usize) -> String {
    format!("number.{}", slot)
}

type BackupRow = (
    Option<bool>,
    Option<bool>,
    Option<i32>,
    Option<String>,
    Option<u32>,
);

pub struct SqliteBackupStore {
    conn: Mutex<Connection>,
}

impl SqliteBackupStore {
    /// Open (or create) the database at `path` and bring its schema up to
    /// date
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = db::open(path)?;
        db::configure(&conn)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| lock_poisoned())
    }

    fn put_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO feature_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value, chrono::Utc::now().timestamp()],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    fn get_state(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM feature_state WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)
    }

    fn upsert_backup(conn: &Connection, sub_id: SubId, backup: &SlotBackup) -> Result<()> {
        let cf = backup.call_forwarding.as_ref();
        conn.execute(
            "INSERT INTO slot_backups
                (sub_id, call_waiting_enabled, cf_enabled, cf_reason, cf_number, cf_timeout_seconds, backed_up_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(sub_id) DO UPDATE SET
                call_waiting_enabled = excluded.call_waiting_enabled,
                cf_enabled = excluded.cf_enabled,
                cf_reason = excluded.cf_reason,
                cf_number = excluded.cf_number,
                cf_timeout_seconds = excluded.cf_timeout_seconds,
                backed_up_at = excluded.backed_up_at",
            rusqlite::params![
                sub_id.raw(),
                backup.call_waiting_enabled,
                cf.map(|info| info.enabled),
                cf.map(|info| info.reason.code()),
                cf.and_then(|info| info.number()),
                cf.map(|info| info.timeout_seconds),
                chrono::Utc::now().timestamp(),
            ],
        )
        .map_err(|e| from_rusqlite(e).with_sub_id(sub_id))?;
        Ok(())
    }

    fn decode(row: BackupRow) -> Result<SlotBackup> {
        let (call_waiting_enabled, cf_enabled, cf_reason, cf_number, cf_timeout) = row;
        let call_forwarding = match cf_enabled {
            None => None,
            Some(enabled) => {
                let code = cf_reason.ok_or_else(|| corrupt_row("slot_backups", "missing cf_reason"))?;
                let reason = CallForwardingReason::from_code(code).ok_or_else(|| {
                    corrupt_row("slot_backups", &format!("unknown cf_reason {}", code))
                })?;
                Some(CallForwardingInfo {
                    enabled,
                    reason,
                    number: cf_number.map(Sensitive::new),
                    timeout_seconds: cf_timeout.unwrap_or(0),
                })
            }
        };
        Ok(SlotBackup {
            call_waiting_enabled,
            call_forwarding,
        })
    }
}

impl BackupStore for SqliteBackupStore {
    fn save_backup(&self, sub_id: SubId, backup: &SlotBackup) -> Result<()> {
        let conn = self.conn()?;
        Self::upsert_backup(&conn, sub_id, backup)?;
        tracing::debug!(sub_id = sub_id.raw(), "backup saved");
        Ok(())
    }

    fn load_backup(&self, sub_id: SubId) -> Result<Option<SlotBackup>> {
        let conn = self.conn()?;
        let row: Option<BackupRow> = conn
            .query_row(
                "SELECT call_waiting_enabled, cf_enabled, cf_reason, cf_number, cf_timeout_seconds
                 FROM slot_backups WHERE sub_id = ?1",
                [sub_id.raw()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()
            .map_err(from_rusqlite)?;
        row.map(Self::decode)
            .transpose()
            .map_err(|e| e.with_sub_id(sub_id))
    }

    fn clear_backup(&self, sub_id: SubId) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM slot_backups WHERE sub_id = ?1", [sub_id.raw()])
            .map_err(from_rusqlite)?;
        Ok(())
    }

    fn set_feature_enabled(&self, enabled: bool) -> Result<()> {
        let conn = self.conn()?;
        Self::put_state(&conn, KEY_ENABLED, if enabled { "true" } else { "false" })
    }

    fn is_feature_enabled(&self) -> Result<bool> {
        let conn = self.conn()?;
        Ok(Self::get_state(&conn, KEY_ENABLED)?.as_deref() == Some("true"))
    }

    fn save_forwarding_number(&self, slot: usize, number: &str) -> Result<()> {
        let conn = self.conn()?;
        Self::put_state(&conn, &number_key(slot), number)
    }

    fn load_forwarding_number(&self, slot: usize) -> Result<Option<String>> {
        let conn = self.conn()?;
        Self::get_state(&conn, &number_key(slot))
    }

    fn commit_enable(
        &self,
        backups: &[(SubId, SlotBackup)],
        numbers: &[(usize, String)],
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        for (sub_id, backup) in backups {
            Self::upsert_backup(&tx, *sub_id, backup)?;
        }
        for (slot, number) in numbers {
            Self::put_state(&tx, &number_key(*slot), number)?;
        }
        Self::put_state(&tx, KEY_ENABLED, "true")?;
        tx.commit().map_err(from_rusqlite)?;
        tracing::debug!(backup_count = backups.len(), "enable committed");
        Ok(())
    }
}

impl std::fmt::Debug for SqliteBackupStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackupStore").finish_non_exhaustive()
    }
}
