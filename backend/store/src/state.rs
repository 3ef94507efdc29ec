use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

/// File name of the state file inside the state directory.
const STATE_FILE_NAME: &str = "state.json";

/// The full persisted key set, serialized with the storage key names the
/// rest of the system expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    /// Text of the last broadcast inference result.
    pub response: Option<String>,
    pub subscription_active: bool,
    pub subscription_id: Option<String>,
    pub stealth_mode: bool,
    pub stealth_mode_expiry: Option<DateTime<Utc>>,
}

/// Resolve the SnapLens state directory.
/// Priority: `SNAPLENS_STATE_DIR` env > `~/.snaplens/`
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SNAPLENS_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".snaplens");
    }
    PathBuf::from(".snaplens")
}

/// Write-through store over the persisted state file.
///
/// Keeps an in-memory copy so reads are synchronous; every mutation is
/// written back atomically (temp file + rename).
pub struct StateStore {
    path: PathBuf,
    cached: Mutex<PersistedState>,
}

impl StateStore {
    /// Open the store at `dir`, loading existing state if present.
    /// A missing file is a first run and yields defaults.
    pub async fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(STATE_FILE_NAME);
        let state = if path.exists() {
            let raw = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read state file: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse state file: {}", path.display()))?
        } else {
            debug!(path = %path.display(), "State file does not exist; using defaults");
            PersistedState::default()
        };

        info!(path = %path.display(), "State store opened");
        Ok(Self {
            path,
            cached: Mutex::new(state),
        })
    }

    /// Current state (in-memory copy).
    pub fn snapshot(&self) -> PersistedState {
        self.cached.lock().unwrap().clone()
    }

    /// Apply a mutation and persist the result atomically.
    pub async fn update<F>(&self, mutate: F) -> Result<PersistedState>
    where
        F: FnOnce(&mut PersistedState),
    {
        let state = {
            let mut cached = self.cached.lock().unwrap();
            mutate(&mut cached);
            cached.clone()
        };
        self.write(&state).await?;
        Ok(state)
    }

    /// Write state to disk atomically (write to temp file, rename).
    async fn write(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create state directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(state)
            .context("Failed to serialize persisted state")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write temp state file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Persisted state written");
        Ok(())
    }
}
