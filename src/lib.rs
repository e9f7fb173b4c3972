// Modsync - Steam Workshop mod synchronizer for dedicated Arma 3 servers
// Keeps a server's local mod mirror in step with the workshop via steamcmd.

pub mod cli;
pub mod config;
pub mod models;
pub mod parser;
pub mod state;
pub mod sync;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use config::Config;
pub use models::{ModRecord, ModStatus};
pub use state::{JsonRosterStore, ModRegistry, RosterStore};
