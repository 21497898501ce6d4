//! Settings persistence

use std::path::{Path, PathBuf};

use sqlrun_core::{Result, SqlRunError};

use crate::Settings;

/// Loads and saves the JSON settings file.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the conventional per-user location.
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            SqlRunError::Config("could not determine the user config directory".into())
        })?;
        Ok(Self::new(base.join("sqlrun").join("config.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read settings; a missing file yields the defaults.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            tracing::debug!("no settings file, using defaults");
            return Ok(Settings::default());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let settings = serde_json::from_str(&content)?;
        tracing::debug!("settings loaded");
        Ok(settings)
    }

    /// Write settings as pretty JSON, creating the parent directory when
    /// needed.
    #[tracing::instrument(skip(self, settings), fields(path = %self.path.display()))]
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, content).await?;
        tracing::info!("settings saved");
        Ok(())
    }
}
