//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Schematic tool command-line arguments.
///
/// CLI values override settings loaded from `strata.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Pack and unpack voxel region schematics")]
pub struct CliArgs {
    /// Horizontal half-extent of the captured box.
    #[arg(long)]
    pub radius: Option<i32>,

    /// Box height above the anchor.
    #[arg(long)]
    pub height: Option<i32>,

    /// Require a solid floor when unpacking.
    #[arg(long)]
    pub require_floor: Option<bool>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(radius) = args.radius {
            self.tool.radius = radius;
        }
        if let Some(height) = args.height {
            self.tool.height = height;
        }
        if let Some(floor) = args.require_floor {
            self.tool.require_floor = floor;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
