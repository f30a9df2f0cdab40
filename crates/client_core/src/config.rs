use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use analysis_engine::MockEngineOptions;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_SETTINGS_PATH: &str = "analysis.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub step_delay_ms: u64,
    pub result_delay_ms: u64,
    /// Upper bound on each engine wait. `None` or `0` waits indefinitely.
    pub step_timeout_ms: Option<u64>,
    pub event_buffer: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            step_delay_ms: 1500,
            result_delay_ms: 1000,
            step_timeout_ms: None,
            event_buffer: 256,
        }
    }
}

impl ControllerSettings {
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn mock_engine_options(&self) -> MockEngineOptions {
        MockEngineOptions {
            step_delay: Duration::from_millis(self.step_delay_ms),
            result_delay: Duration::from_millis(self.result_delay_ms),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    step_delay_ms: Option<u64>,
    result_delay_ms: Option<u64>,
    step_timeout_ms: Option<u64>,
    event_buffer: Option<usize>,
}

/// Defaults, then `analysis.toml` (or `APP__SETTINGS_PATH`) if present, then
/// `APP__*` environment overrides. Unreadable files fall back to defaults.
pub fn load_settings() -> ControllerSettings {
    let path = std::env::var("APP__SETTINGS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH));

    let settings = if path.exists() {
        match load_settings_from(&path) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("settings: {err}; using defaults");
                ControllerSettings::default()
            }
        }
    } else {
        ControllerSettings::default()
    };

    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path) -> Result<ControllerSettings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings(&raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_settings(raw: &str) -> Result<ControllerSettings, toml::de::Error> {
    let file_cfg: SettingsFile = toml::from_str(raw)?;
    let mut settings = ControllerSettings::default();

    if let Some(v) = file_cfg.step_delay_ms {
        settings.step_delay_ms = v;
    }
    if let Some(v) = file_cfg.result_delay_ms {
        settings.result_delay_ms = v;
    }
    if let Some(v) = file_cfg.step_timeout_ms {
        settings.step_timeout_ms = (v > 0).then_some(v);
    }
    if let Some(v) = file_cfg.event_buffer {
        settings.event_buffer = v.max(1);
    }

    Ok(settings)
}

pub fn apply_env_overrides(
    mut settings: ControllerSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> ControllerSettings {
    if let Some(v) = parse_env(&lookup, "APP__STEP_DELAY_MS") {
        settings.step_delay_ms = v;
    }
    if let Some(v) = parse_env(&lookup, "APP__RESULT_DELAY_MS") {
        settings.result_delay_ms = v;
    }
    if let Some(v) = parse_env(&lookup, "APP__STEP_TIMEOUT_MS") {
        settings.step_timeout_ms = (v > 0).then_some(v);
    }
    if let Some(v) = parse_env::<usize>(&lookup, "APP__EVENT_BUFFER") {
        settings.event_buffer = v.max(1);
    }
    settings
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("settings: ignoring malformed {key}={raw}");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
