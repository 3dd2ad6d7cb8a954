//! Caller-side orchestration of the feature switch
//!
//! Runs the enable/disable tasks and keeps the backup store in step with
//! the outcome. Callers are expected to serialize enable and disable.

use crate::backup::{BackupStore, SlotBackup};
use crate::config::SmartForwardingConfig;
use crate::errors::FwdError;
use crate::model::FailureReason;
use crate::task::{DisableSmartForwardingTask, EnableSmartForwardingTask};
use crate::telephony::{PlatformServices, SubId};
use serde::Serialize;
use smartfwd_core_types::Sensitive;
use std::fmt;
use std::sync::Arc;

/// What the user is told after a switch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserNotice {
    Enabled,
    Disabled,
    GenericFailure,
    SimNotActive,
}

impl UserNotice {
    pub fn is_failure(&self) -> bool {
        matches!(self, UserNotice::GenericFailure | UserNotice::SimNotActive)
    }
}

impl fmt::Display for UserNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UserNotice::Enabled => "Smart forwarding is on",
            UserNotice::Disabled => "Smart forwarding is off",
            UserNotice::GenericFailure => "Smart forwarding could not be changed, try again later",
            UserNotice::SimNotActive => "Both SIM cards must be active to use smart forwarding",
        };
        f.write_str(text)
    }
}

/// Stored view of one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    pub slot: usize,
    pub sub_id: SubId,
    pub forwarding_number: Option<Sensitive<String>>,
    pub has_backup: bool,
}

/// Stored view of the feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureStatus {
    pub enabled: bool,
    pub slots: Vec<SlotStatus>,
}

pub struct SmartForwardingService {
    services: PlatformServices,
    store: Arc<dyn BackupStore>,
    config: SmartForwardingConfig,
}

impl SmartForwardingService {
    pub fn new(
        services: PlatformServices,
        store: Arc<dyn BackupStore>,
        config: SmartForwardingConfig,
    ) -> Self {
        Self {
            services,
            store,
            config,
        }
    }

    /// Switch forwarding on with one number per active slot
    ///
    /// A no-op when the feature is already on: running again would capture
    /// the forwarded state and overwrite the backups taken before it.
    /// Backups and the enabled flag are written only after a successful
    /// run. `Err` is returned only when the store fails; the device is then
    /// put back from the fresh backups.
    pub fn enable(&self, phone_numbers: Vec<String>) -> Result<UserNotice, FwdError> {
        if self.store.is_feature_enabled()? {
            tracing::info!("smart forwarding already enabled");
            return Ok(UserNotice::Enabled);
        }

        let task = EnableSmartForwardingTask::new(
            self.services.clone(),
            phone_numbers,
            self.config.clone(),
        );
        let result = match task.run() {
            Ok(result) => result,
            Err(e) => {
                let fwd: FwdError = e.into();
                tracing::warn!(err.code = fwd.code(), detail = %fwd, "enable did not finish");
                return Ok(UserNotice::GenericFailure);
            }
        };

        if !result.is_success() {
            return Ok(match result.reason() {
                Some(FailureReason::SimNotActive) => UserNotice::SimNotActive,
                Some(FailureReason::NetworkError) | None => UserNotice::GenericFailure,
            });
        }

        let backups: Vec<(SubId, SlotBackup)> = result
            .slots()
            .iter()
            .map(|slot| (slot.sub_id(), SlotBackup::from_slot(slot)))
            .collect();
        let numbers: Vec<(usize, String)> = result
            .slots()
            .iter()
            .map(|slot| (slot.slot_index(), slot.forwarding_number().expose().clone()))
            .collect();

        if let Err(e) = self.store.commit_enable(&backups, &numbers) {
            tracing::error!(err.code = e.code(), detail = %e, "backups not saved, restoring device");
            let restore = DisableSmartForwardingTask::new(
                self.services.clone(),
                backups.into_iter().map(|(_, backup)| Some(backup)).collect(),
                self.config.clone(),
            );
            if let Err(undo) = restore.run() {
                let fwd: FwdError = undo.into();
                tracing::warn!(err.code = fwd.code(), detail = %fwd, "device restore did not finish");
            }
            return Err(e);
        }
        Ok(UserNotice::Enabled)
    }

    /// Switch forwarding off, restoring every backed-up slot
    ///
    /// Backups stay in the store when the task itself fails so a retry can
    /// still use them.
    pub fn disable(&self) -> Result<UserNotice, FwdError> {
        let sub_ids = self.active_sub_ids();
        let mut backups = Vec::with_capacity(sub_ids.len());
        for sub_id in &sub_ids {
            let backup = if sub_id.is_valid() {
                self.store.load_backup(*sub_id)?
            } else {
                None
            };
            backups.push(backup);
        }

        let task =
            DisableSmartForwardingTask::new(self.services.clone(), backups, self.config.clone());
        if let Err(e) = task.run() {
            let fwd: FwdError = e.into();
            tracing::warn!(err.code = fwd.code(), detail = %fwd, "disable did not finish");
            return Ok(UserNotice::GenericFailure);
        }

        for sub_id in sub_ids.into_iter().filter(SubId::is_valid) {
            self.store.clear_backup(sub_id)?;
        }
        self.store.set_feature_enabled(false)?;
        Ok(UserNotice::Disabled)
    }

    pub fn status(&self) -> Result<FeatureStatus, FwdError> {
        let enabled = self.store.is_feature_enabled()?;
        let mut slots = Vec::new();
        for (slot, sub_id) in self.active_sub_ids().into_iter().enumerate() {
            let has_backup = sub_id.is_valid() && self.store.load_backup(sub_id)?.is_some();
            slots.push(SlotStatus {
                slot,
                sub_id,
                forwarding_number: self.store.load_forwarding_number(slot)?.map(Sensitive::new),
                has_backup,
            });
        }
        Ok(FeatureStatus { enabled, slots })
    }

    fn active_sub_ids(&self) -> Vec<SubId> {
        let Some(subscriptions) = &self.services.subscriptions else {
            return Vec::new();
        };
        (0..subscriptions.active_modem_count())
            .map(|slot| subscriptions.subscription_id_for_slot(slot))
            .collect()
    }
}

impl fmt::Debug for SmartForwardingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartForwardingService")
            .field("services", &self.services)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
