//! Tool settings with defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name inside the config directory.
pub const CONFIG_FILE: &str = "strata.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Pack/unpack tool behaviour.
    pub tool: ToolConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Settings for the pack/unpack tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    /// Horizontal half-extent of the captured box.
    pub radius: i32,
    /// Box height above the anchor. Values below 3 are raised to 3.
    pub height: i32,
    /// Saturation consumed by each successful pack or unpack.
    pub build_effort: f32,
    /// Unpacking requires a solid-topped floor under the whole footprint.
    pub require_floor: bool,
    /// Plants and loose rock count as clear space when unpacking.
    pub replace_soft_materials: bool,
    /// ARGB hex colour for blocked cells; `#`, `0x` and `&h` prefixes accepted.
    pub highlight_error_color: String,
    /// How long blocked cells stay highlighted.
    pub highlight_duration_ms: u64,
    /// Material codes that may not be packed. `*` wildcards allowed.
    pub banned_materials: Vec<String>,
    /// Serialized schematics of at least this many bytes are LZ4-compressed.
    pub compress_threshold: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "strata_schematic=trace").
    pub log_level: String,
}

impl ToolConfig {
    /// Height actually used for the box.
    pub fn effective_height(&self) -> i32 {
        self.height.max(3)
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            radius: 3,
            height: 7,
            build_effort: 100.0,
            require_floor: false,
            replace_soft_materials: true,
            highlight_error_color: "#2FFF0000".to_string(),
            highlight_duration_ms: 2500,
            banned_materials: default_banned_materials(),
            compress_threshold: 256,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Materials that must stay where they are: world-generated resources,
/// growing plants, fluids, and a few machines with fragile state.
pub fn default_banned_materials() -> Vec<String> {
    [
        "game:log-grown-*",
        "game:log-resin-*",
        "game:log-resinharvested-*",
        "game:statictranslocator-*",
        "game:teleporterbase",
        "game:crop-*",
        "game:herb-*",
        "game:mushroom-*",
        "game:smallberrybush-*",
        "game:bigberrybush-*",
        "game:water-*",
        "game:lava-*",
        "game:farmland-*",
        "game:rawclay-*",
        "game:peat-*",
        "game:rock-*",
        "game:ore-*",
        "game:crock-burned-*",
        "game:bowl-meal",
        "game:claypot-cooked",
        "game:anvil-*",
        "game:forge",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(config_dir)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as [`CONFIG_FILE`].
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::WriteError {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::WriteError {
            path: config_path.clone(),
            source,
        })?;
        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Re-reads the file; `Some(new_config)` only if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(config_dir)?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::ParseError { path, source })
    }
}
