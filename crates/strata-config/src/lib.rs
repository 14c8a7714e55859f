//! Configuration for the schematic tools.
//!
//! Settings persist to disk as RON, accept CLI overrides via clap, and can be
//! polled for on-disk changes. Missing fields fall back to defaults so older
//! files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE, Config, DebugConfig, ToolConfig, default_banned_materials};
pub use error::ConfigError;
