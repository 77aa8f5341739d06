//! Bridge settings
//!
//! Small JSON file under the user's config dir. Precedence, lowest first:
//! built-in defaults, the settings file, environment variables, CLI flags
//! (applied by the caller).

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{config, paths, shell};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Root-owned config file the bridge reads and writes
    #[serde(default = "default_config_path")]
    pub config_path: String,

    /// Binary that opens the elevated channel
    #[serde(default = "default_su_binary")]
    pub su_binary: String,

    /// Octal mode applied after every write
    #[serde(default = "default_file_mode")]
    pub file_mode: String,
}

fn default_config_path() -> String {
    paths::LOCATION_CONF.to_string()
}

fn default_su_binary() -> String {
    shell::DEFAULT_SU.to_string()
}

fn default_file_mode() -> String {
    shell::FILE_MODE.to_string()
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            su_binary: default_su_binary(),
            file_mode: default_file_mode(),
        }
    }
}

impl BridgeSettings {
    pub fn settings_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from the default settings path, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::settings_path())?;
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults when `path` does not exist; an unreadable or malformed file is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .context(format!("Failed to read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&contents)
            .context(format!("Failed to parse settings file {}", path.display()))?;
        info!(path = %path.display(), "Loaded bridge settings");
        Ok(settings)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::settings_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create settings directory: {}", parent.display()))?;
        }
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize settings to JSON")?;
        fs::write(path, contents)
            .context(format!("Failed to write settings file to {}", path.display()))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            env::var(config::ENV_CONFIG_PATH).ok(),
            env::var(config::ENV_SU).ok(),
        );
    }

    /// Replace fields with any non-empty override
    pub fn apply_overrides(&mut self, config_path: Option<String>, su_binary: Option<String>) {
        if let Some(path) = config_path.filter(|p| !p.trim().is_empty()) {
            debug!(config_path = %path, "Overriding config path");
            self.config_path = path;
        }
        if let Some(su) = su_binary.filter(|s| !s.trim().is_empty()) {
            debug!(su_binary = %su, "Overriding su binary");
            self.su_binary = su;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.config_path.trim().is_empty() {
            bail!("config_path must not be empty");
        }
        if self.su_binary.trim().is_empty() {
            bail!("su_binary must not be empty");
        }
        if self.config_path.contains('\0') || self.su_binary.contains('\0') {
            bail!("config_path and su_binary must not contain NUL bytes");
        }
        let mode = self.file_mode.as_str();
        if mode.is_empty() || mode.len() > 4 || !mode.chars().all(|c| ('0'..='7').contains(&c)) {
            bail!("file_mode must be an octal permission such as 644, got {mode:?}");
        }
        Ok(())
    }
}
