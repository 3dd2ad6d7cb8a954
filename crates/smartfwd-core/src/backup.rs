//! Backup of per-slot call settings
//!
//! When forwarding is switched on, the state each slot had before is kept
//! so switching it off can put it back. [`BackupStore`] is the seam: the
//! core ships an in-memory store and `smartfwd-store` a SQLite one.

use crate::errors::{FwdError, FwdErrorKind};
use crate::model::{CallForwardingInfo, SlotUtData};
use crate::telephony::SubId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Prior call settings of one subscription
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotBackup {
    /// `None` when the query never produced a definite answer
    pub call_waiting_enabled: Option<bool>,
    pub call_forwarding: Option<CallForwardingInfo>,
}

impl SlotBackup {
    pub fn from_slot(slot: &SlotUtData) -> Self {
        Self {
            call_waiting_enabled: slot.call_waiting_before().and_then(|s| s.as_enabled()),
            call_forwarding: slot.call_forwarding_before(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.call_waiting_enabled.is_none() && self.call_forwarding.is_none()
    }
}

/// Persistent state of the feature
pub trait BackupStore: Send + Sync {
    fn save_backup(&self, sub_id: SubId, backup: &SlotBackup) -> Result<(), FwdError>;

    fn load_backup(&self, sub_id: SubId) -> Result<Option<SlotBackup>, FwdError>;

    fn clear_backup(&self, sub_id: SubId) -> Result<(), FwdError>;

    fn set_feature_enabled(&self, enabled: bool) -> Result<(), FwdError>;

    fn is_feature_enabled(&self) -> Result<bool, FwdError>;

    /// Remember the number slot `slot` forwards to
    fn save_forwarding_number(&self, slot: usize, number: &str) -> Result<(), FwdError>;

    fn load_forwarding_number(&self, slot: usize) -> Result<Option<String>, FwdError>;

    /// Record a successful enable: every backup, every slot's number and
    /// the enabled flag, all or nothing
    fn commit_enable(
        &self,
        backups: &[(SubId, SlotBackup)],
        numbers: &[(usize, String)],
    ) -> Result<(), FwdError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    backups: HashMap<SubId, SlotBackup>,
    numbers: HashMap<usize, String>,
    enabled: bool,
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryBackupStore {
    state: Mutex<MemoryState>,
}

impl InMemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, FwdError> {
        self.state.lock().map_err(|_| {
            FwdError::new(FwdErrorKind::Persistence).with_message("backup store lock poisoned")
        })
    }
}

impl BackupStore for InMemoryBackupStore {
    fn save_backup(&self, sub_id: SubId, backup: &SlotBackup) -> Result<(), FwdError> {
        self.lock()?.backups.insert(sub_id, backup.clone());
        Ok(())
    }

    fn load_backup(&self, sub_id: SubId) -> Result<Option<SlotBackup>, FwdError> {
        Ok(self.lock()?.backups.get(&sub_id).cloned())
    }

    fn clear_backup(&self, sub_id: SubId) -> Result<(), FwdError> {
        self.lock()?.backups.remove(&sub_id);
        Ok(())
    }

    fn set_feature_enabled(&self, enabled: bool) -> Result<(), FwdError> {
        self.lock()?.enabled = enabled;
        Ok(())
    }

    fn is_feature_enabled(&self) -> Result<bool, FwdError> {
        Ok(self.lock()?.enabled)
    }

    fn save_forwarding_number(&self, slot: usize, number: &str) -> Result<(), FwdError> {
        self.lock()?.numbers.insert(slot, number.to_string());
        Ok(())
    }

    fn load_forwarding_number(&self, slot: usize) -> Result<Option<String>, FwdError> {
        Ok(self.lock()?.numbers.get(&slot).cloned())
    }

    fn commit_enable(
        &self,
        backups: &[(SubId, SlotBackup)],
        numbers: &[(usize, String)],
    ) -> Result<(), FwdError> {
        let mut state = self.lock()?;
        state.backups.extend(backups.iter().cloned());
        state.numbers.extend(numbers.iter().cloned());
        state.enabled = true;
        Ok(())
    }
}
