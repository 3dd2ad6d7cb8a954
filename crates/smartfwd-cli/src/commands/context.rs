//! Shared flags and the per-invocation session

use clap::Args;
use smartfwd_core::backup::BackupStore;
use smartfwd_core::sim::{DeviceState, SimulatedDevice};
use smartfwd_core::{PlatformServices, SmartForwardingConfig, SmartForwardingService};
use smartfwd_store::SqliteBackupStore;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type CliResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Simulated device state file
    #[arg(long, global = true, default_value = ".smartfwd/device.json")]
    pub state: PathBuf,

    /// Backup database
    #[arg(long, global = true, default_value = ".smartfwd/state.db")]
    pub db: PathBuf,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalArgs {
    pub fn load_config(&self) -> Result<SmartForwardingConfig, Box<dyn Error>> {
        let config = match &self.config {
            Some(path) => SmartForwardingConfig::load(path)?,
            None => SmartForwardingConfig::default().apply_env_overrides()?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Everything one command needs: device, store and config
pub struct Session {
    pub device: Arc<SimulatedDevice>,
    pub store: Arc<SqliteBackupStore>,
    pub config: SmartForwardingConfig,
    state_path: PathBuf,
}

impl Session {
    pub fn open(global: &GlobalArgs) -> Result<Self, Box<dyn Error>> {
        let config = global.load_config()?;
        let device = Arc::new(SimulatedDevice::from_state(read_device_state(&global.state)?));
        ensure_parent(&global.db)?;
        let store = Arc::new(SqliteBackupStore::open(&global.db)?);
        Ok(Self {
            device,
            store,
            config,
            state_path: global.state.clone(),
        })
    }

    pub fn service(&self) -> SmartForwardingService {
        let store: Arc<dyn BackupStore> = self.store.clone();
        SmartForwardingService::new(
            PlatformServices::from_device(self.device.clone()),
            store,
            self.config.clone(),
        )
    }

    /// Write the device back, without the faults injected for this run
    pub fn save_device(&self) -> CliResult {
        self.device.clear_faults();
        write_device_state(&self.state_path, &self.device.snapshot())
    }
}

pub fn read_device_state(path: &Path) -> Result<DeviceState, Box<dyn Error>> {
    if !path.exists() {
        return Err(format!(
            "no device state at {}; run `device init` first",
            path.display()
        )
        .into());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_device_state(path: &Path, state: &DeviceState) -> CliResult {
    ensure_parent(path)?;
    std::fs::write(path, serde_json::to_string_pretty(state)?)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> CliResult {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
