//! smartfwd CLI
//!
//! Drives smart forwarding against a simulated dual-SIM device whose state
//! is kept in a JSON file, with backups in a SQLite database.

use clap::{Parser, Subcommand};
use smartfwd_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "smartfwd")]
#[command(about = "smartfwd - Smart call forwarding between SIM slots", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::context::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Turn smart forwarding on
    Enable(commands::enable::EnableArgs),
    /// Turn smart forwarding off and restore the previous settings
    Disable,
    /// Show the stored feature state and the device's settings
    Status,
    /// Simulated device operations
    Device(commands::device::DeviceArgs),
}

fn main() {
    let cli = Cli::parse();

    init(if cli.global.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match cli.command {
        Commands::Enable(args) => commands::enable::execute(&cli.global, args),
        Commands::Disable => commands::disable::execute(&cli.global),
        Commands::Status => commands::status::execute(&cli.global),
        Commands::Device(args) => commands::device::execute(&cli.global, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
