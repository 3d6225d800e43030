//! Host configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `VIGIL_WORK_DIR` and `VIGIL_LOG_LEVEL` env overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// Monitor daemon configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Process name the supervisor looks for in the OS process table.
    pub service_name: String,
    /// Command used to start the daemon when it is absent.
    pub command: String,
    /// Arguments passed to `command`.
    pub args: Vec<String>,
}

/// Fully-resolved host configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    /// Working directory for all persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    pub monitor: MonitorConfig,
}

impl Config {
    /// Path of the preference file under `work_dir`.
    pub fn prefs_path(&self) -> PathBuf {
        self.work_dir.join("prefs.toml")
    }

    /// Directory crash reports are written to.
    pub fn crash_dir(&self) -> PathBuf {
        self.work_dir.join("crashes")
    }
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    host: RawHost,
    #[serde(default)]
    monitor: RawMonitor,
}

#[derive(Deserialize)]
struct RawHost {
    app_name: String,
    work_dir: String,
    log_level: String,
}

#[derive(Deserialize)]
struct RawMonitor {
    #[serde(default = "default_service_name")]
    service_name: String,
    /// Defaults to the service name: the daemon binary is on PATH.
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
}

impl Default for RawMonitor {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            command: None,
            args: Vec::new(),
        }
    }
}

fn default_service_name() -> String {
    "vigil-monitord".to_string()
}

/// Load config from `config/default.toml`, then apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let work_dir_override = env::var("VIGIL_WORK_DIR").ok();
    let log_level_override = env::var("VIGIL_LOG_LEVEL").ok();
    load_from(
        Path::new("config/default.toml"),
        work_dir_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let work_dir_str = work_dir_override.unwrap_or(&parsed.host.work_dir).to_string();
    let work_dir = expand_home(&work_dir_str);
    let log_level = log_level_override.unwrap_or(&parsed.host.log_level).to_string();

    let service_name = parsed.monitor.service_name;
    let command = parsed.monitor.command.unwrap_or_else(|| service_name.clone());

    Ok(Config {
        app_name: parsed.host.app_name,
        work_dir,
        log_level,
        monitor: MonitorConfig {
            service_name,
            command,
            args: parsed.monitor.args,
        },
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for unit tests — never starts a real daemon (the configured
/// command does not exist on any sane PATH).
#[cfg(test)]
impl Config {
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            app_name: "vigil-test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            monitor: MonitorConfig {
                service_name: "vigil-test-monitord".into(),
                command: "/nonexistent/vigil-test-monitord".into(),
                args: Vec::new(),
            },
        }
    }
}
