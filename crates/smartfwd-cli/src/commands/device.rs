//! Simulated device commands

use crate::commands::context::{read_device_state, write_device_state, CliResult, GlobalArgs};
use clap::{Args, Subcommand};
use smartfwd_core::sim::SimulatedDevice;

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Create a fresh device: all slots active, call waiting off, no forwarding
    Init(InitArgs),
    /// Print the device state as JSON
    Show,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(long, default_value_t = 2)]
    pub slots: usize,

    /// Slots whose SIM is out of service
    #[arg(long)]
    pub inactive: Vec<usize>,
}

pub fn execute(global: &GlobalArgs, args: DeviceArgs) -> CliResult {
    match args.command {
        DeviceCommand::Init(init_args) => execute_init(global, init_args),
        DeviceCommand::Show => {
            let state = read_device_state(&global.state)?;
            println!("{}", serde_json::to_string_pretty(&state)?);
            Ok(())
        }
    }
}

fn execute_init(global: &GlobalArgs, args: InitArgs) -> CliResult {
    if args.slots == 0 {
        return Err("--slots must be at least 1".into());
    }
    let device = SimulatedDevice::with_slots(args.slots);
    for slot in args.inactive {
        device.deactivate_slot(slot);
    }
    write_device_state(&global.state, &device.snapshot())?;
    tracing::info!(slots = args.slots, path = %global.state.display(), "device initialized");
    println!("Device initialized with {} slot(s)", args.slots);
    Ok(())
}
