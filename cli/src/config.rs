//! CLI configuration: TOML file plus command-line overrides

use anyhow::{Context, Result};
use launchpad::{Address, LaunchpadConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/launchpad/config.toml";
pub const DEFAULT_STATE_PATH: &str = "~/.config/launchpad/state.json";

/// On-disk layout of `config.toml`
///
/// ```toml
/// state_path = "~/launchpad/state.json"
/// caller = "alice"
///
/// [launchpad]
/// migration_threshold = "80_000000000000000000"
/// remainder_policy = "retain"
///
/// [launchpad.curve]
/// base_price = 10_000_000_000
/// slope = 200
/// unit = "1_000000000000000000"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub state_path: Option<String>,
    pub caller: Option<String>,
    pub launchpad: LaunchpadConfig,
}

pub struct CliConfig {
    pub config_path: PathBuf,
    pub state_path: PathBuf,
    /// Identity used for buys, sells and transfers
    pub caller: Address,
    /// Applied by `init`; an existing state file carries its own
    pub launchpad: LaunchpadConfig,
}

impl CliConfig {
    pub fn new(
        config_path: Option<PathBuf>,
        state_path: Option<PathBuf>,
        caller: Option<String>,
    ) -> Result<Self> {
        let explicit = config_path.is_some();
        let config_path = config_path.unwrap_or_else(|| expand(DEFAULT_CONFIG_PATH));

        let file = if config_path.exists() {
            load_file_config(&config_path)?
        } else if explicit {
            anyhow::bail!("Config file not found: {}", config_path.display());
        } else {
            FileConfig::default()
        };

        let state_path = state_path
            .or_else(|| file.state_path.as_deref().map(expand))
            .unwrap_or_else(|| expand(DEFAULT_STATE_PATH));

        let caller = caller
            .or(file.caller)
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "anonymous".to_string());

        Ok(Self {
            config_path,
            state_path,
            caller: Address::new(caller),
            launchpad: file.launchpad,
        })
    }
}

/// Expand `~` and environment variables
pub fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let file: FileConfig = toml::from_str(&data)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    file.launchpad
        .validate()
        .with_context(|| format!("Invalid launchpad settings in: {}", path.display()))?;

    Ok(file)
}
