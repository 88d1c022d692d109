//! Tool settings stored in `/etc/autotrade-ops.toml`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings file consulted when neither `--settings` nor the env var is set.
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/autotrade-ops.toml";
/// Environment variable naming an alternative settings file.
pub const SETTINGS_ENV: &str = "AUTOTRADE_OPS_SETTINGS";

/// Operator tool settings (TOML).
///
/// Every fixed path and name the tools touch lives here so tests and
/// staging hosts can point them at sandboxed locations. Missing fields
/// default to the production layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub sweep: SweepSettings,
    pub config_edit: ConfigEditSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SweepSettings {
    /// Directory tree walked for sentinel-bearing directories.
    pub root: PathBuf,

    /// Marker lines must start with this prefix to name the active directory.
    pub managed_prefix: String,

    /// File name whose presence marks a directory as sweepable.
    pub sentinel: String,

    /// Append-only log written by the service, one directory per line.
    pub marker_file: PathBuf,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/tmp"),
            managed_prefix: "/tmp/".to_string(),
            sentinel: "fx_debug_log.txt".to_string(),
            marker_file: PathBuf::from("/opt/Innovations/System/last_temp/last_temp.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigEditSettings {
    /// XML configuration document edited by `config-edit`.
    pub document: PathBuf,

    /// Restart command (argv) run after a confirmed change.
    pub restart_command: Vec<String>,

    /// Kill the restart command after this many seconds. Unset waits forever.
    pub restart_timeout_secs: Option<u64>,
}

impl Default for ConfigEditSettings {
    fn default() -> Self {
        Self {
            document: PathBuf::from("/opt/Innovations/System/bot_config.xml"),
            restart_command: vec!["/opt/tools/Restart.sh".to_string()],
            restart_timeout_secs: None,
        }
    }
}

impl ConfigEditSettings {
    pub fn restart_timeout(&self) -> Option<Duration> {
        self.restart_timeout_secs.map(Duration::from_secs)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.sweep.root.as_os_str().is_empty() {
            return Err(anyhow!("sweep.root must not be empty"));
        }
        if self.sweep.managed_prefix.trim().is_empty() {
            return Err(anyhow!("sweep.managed_prefix must not be empty"));
        }
        if self.sweep.sentinel.trim().is_empty() {
            return Err(anyhow!("sweep.sentinel must not be empty"));
        }
        if self.sweep.sentinel.contains('/') {
            return Err(anyhow!("sweep.sentinel must be a file name, not a path"));
        }
        if self.sweep.marker_file.as_os_str().is_empty() {
            return Err(anyhow!("sweep.marker_file must not be empty"));
        }
        if self.config_edit.document.as_os_str().is_empty() {
            return Err(anyhow!("config_edit.document must not be empty"));
        }
        if self.config_edit.restart_command.is_empty()
            || self.config_edit.restart_command[0].trim().is_empty()
        {
            return Err(anyhow!(
                "config_edit.restart_command must be a non-empty array"
            ));
        }
        if self.config_edit.restart_timeout_secs == Some(0) {
            return Err(anyhow!("config_edit.restart_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Pick the settings file: explicit flag, then `$AUTOTRADE_OPS_SETTINGS`,
/// then [`DEFAULT_SETTINGS_PATH`].
pub fn settings_path(explicit: Option<&Path>, env_value: Option<OsString>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_SETTINGS_PATH),
    }
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `Settings::default()`.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!(path = %path.display(), "settings file missing, using defaults");
        let settings = Settings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: Settings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("validate {}", path.display()))?;
    debug!(path = %path.display(), "settings loaded");
    Ok(settings)
}
