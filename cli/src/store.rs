//! Local state file: the launchpad snapshot plus the simulated venue

use anyhow::{Context, Result};
use launchpad::{InstrumentId, Launchpad, LaunchpadConfig, PersistedLaunchpad, SimulatedPool};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Serialize, Deserialize)]
pub struct StateFile {
    /// RFC 3339 timestamp of the last save
    pub saved_at: String,
    pub launchpad: PersistedLaunchpad,
    #[serde(default)]
    pub pool: SimulatedPool,
}

/// A loaded launchpad; mutate it, then `save`
pub struct Session {
    path: PathBuf,
    pub saved_at: Option<String>,
    pub launchpad: Launchpad,
    pub pool: SimulatedPool,
}

impl Session {
    /// Start a fresh launchpad at `path`. Refuses to clobber an existing
    /// state file unless `force` is set.
    pub async fn init(path: &Path, config: LaunchpadConfig, force: bool) -> Result<Self> {
        if !force && fs::try_exists(path).await.unwrap_or(false) {
            anyhow::bail!(
                "State file already exists: {}\n\
                 Pass --force to start over",
                path.display()
            );
        }
        let launchpad = Launchpad::new(config).context("Invalid launchpad configuration")?;
        Ok(Self {
            path: path.to_path_buf(),
            saved_at: None,
            launchpad,
            pool: SimulatedPool::new(),
        })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            anyhow::bail!(
                "State file not found: {}\n\
                 Create one with: launchpad init",
                path.display()
            );
        }

        let data = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let file: StateFile = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        let launchpad = Launchpad::from_persisted(file.launchpad)
            .with_context(|| format!("State file failed validation: {}", path.display()))?;

        debug!(
            "loaded {} instruments, {} events from {}",
            launchpad.len(),
            launchpad.events().len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            saved_at: Some(file.saved_at),
            launchpad,
            pool: file.pool,
        })
    }

    /// Write to a sibling temp file, then rename over the old state
    pub async fn save(&mut self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        let saved_at = chrono::Utc::now().to_rfc3339();
        let file = StateFile {
            saved_at: saved_at.clone(),
            launchpad: self.launchpad.to_persisted(),
            pool: self.pool.clone(),
        };
        let data = serde_json::to_string_pretty(&file).context("Failed to serialize state")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)
            .await
            .with_context(|| format!("Failed to write: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))?;

        debug!("saved state to {}", self.path.display());
        self.saved_at = Some(saved_at);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accepts an id (`3`, `#3`) or a symbol (`PEPE`)
    pub fn resolve(&self, instrument: &str) -> Result<InstrumentId> {
        if let Ok(id) = instrument.parse::<InstrumentId>() {
            self.launchpad.instrument(id)?;
            return Ok(id);
        }
        self.launchpad
            .find_by_symbol(instrument)
            .with_context(|| format!("No instrument with id or symbol {:?}", instrument))
    }
}
