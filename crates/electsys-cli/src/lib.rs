//! Electsys CLI — configuration and election loop around the `electsys` adapter.

pub mod config;
pub mod runner;

pub use config::{load_config, resolve_config_path, resolve_cookie, ElectConfig};
pub use runner::{ClassReport, ElectionRunner, RunSummary};
