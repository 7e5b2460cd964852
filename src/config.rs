use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::BackendCatalog;
use crate::ui::UiMode;

const DEFAULT_LOG_DIR: &str = "log";
const DEFAULT_KEY_POLL_MS: u64 = 1;

#[derive(Debug, Deserialize, Default)]
struct DriverConfigFile {
    log_dir: Option<PathBuf>,
    key_poll_ms: Option<u64>,
    backends: Option<Vec<String>>,
    ui: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Directory the trajectories are written into.
    pub log_dir: PathBuf,
    /// Upper bound on the per-frame key poll.
    pub key_poll: Duration,
    /// Backend probe order; `None` uses the build's own catalog.
    pub backends: Option<Vec<String>>,
    pub ui: UiMode,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            key_poll: Duration::from_millis(DEFAULT_KEY_POLL_MS),
            backends: None,
            ui: UiMode::Auto,
        }
    }
}

impl DriverConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("MONO_VIDEO_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DriverConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let ui = match file.ui.as_deref() {
            Some(mode) => UiMode::parse(mode)?,
            None => defaults.ui,
        };
        Ok(Self {
            log_dir: file.log_dir.unwrap_or(defaults.log_dir),
            key_poll: file
                .key_poll_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.key_poll),
            backends: file.backends,
            ui,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("MONO_VIDEO_LOG_DIR") {
            if !dir.trim().is_empty() {
                self.log_dir = PathBuf::from(dir);
            }
        }
        if let Ok(poll) = std::env::var("MONO_VIDEO_KEY_POLL_MS") {
            let ms: u64 = poll.trim().parse().map_err(|_| {
                anyhow!("MONO_VIDEO_KEY_POLL_MS must be an integer number of milliseconds")
            })?;
            self.key_poll = Duration::from_millis(ms);
        }
        if let Ok(backends) = std::env::var("MONO_VIDEO_BACKENDS") {
            let parsed = split_csv(&backends);
            if !parsed.is_empty() {
                self.backends = Some(parsed);
            }
        }
        if let Ok(mode) = std::env::var("MONO_VIDEO_UI") {
            if !mode.trim().is_empty() {
                self.ui = UiMode::parse(&mode)?;
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.key_poll.is_zero() {
            return Err(anyhow!("key poll timeout must be at least 1 ms"));
        }
        if self.log_dir.as_os_str().is_empty() {
            return Err(anyhow!("log_dir must not be empty"));
        }
        self.catalog()?;
        Ok(())
    }

    /// Backend catalog for this run.
    pub fn catalog(&self) -> Result<BackendCatalog> {
        match &self.backends {
            Some(names) if !names.is_empty() => BackendCatalog::from_names(names),
            _ => Ok(BackendCatalog::for_target()),
        }
    }
}

fn read_config_file(path: &Path) -> Result<DriverConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() -> Result<()> {
        let cfg = DriverConfig::from_file(DriverConfigFile::default())?;
        assert_eq!(cfg.log_dir, PathBuf::from("log"));
        assert_eq!(cfg.key_poll, Duration::from_millis(1));
        assert!(cfg.backends.is_none());
        Ok(())
    }

    #[test]
    fn zero_poll_is_rejected() -> Result<()> {
        let mut cfg = DriverConfig::from_file(DriverConfigFile {
            key_poll_ms: Some(0),
            ..DriverConfigFile::default()
        })?;
        assert!(cfg.validate().is_err());
        Ok(())
    }

    #[test]
    fn unknown_backends_are_rejected() -> Result<()> {
        let mut cfg = DriverConfig::from_file(DriverConfigFile {
            backends: Some(vec!["FFMPEG".into(), "DSHOW".into()]),
            ..DriverConfigFile::default()
        })?;
        assert!(cfg.validate().is_err());
        Ok(())
    }

    #[test]
    fn splits_backend_lists() {
        assert_eq!(split_csv(" ffmpeg, ,any,"), vec!["ffmpeg", "any"]);
    }
}
