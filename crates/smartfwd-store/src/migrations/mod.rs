//! Schema migrations for the backup database

mod embedded;
mod runner;

pub use runner::apply_migrations;
