use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::timer::DEFAULT_PRESET_SECS;

pub const CONFIG_PATH_VAR: &str = "WORKOUT_TRACKER_CONFIG";
pub const API_URL_VAR: &str = "WORKOUT_API_URL";
pub const TOKEN_PATH_VAR: &str = "WORKOUT_TOKEN_PATH";
const DEFAULT_CONFIG_FILE: &str = "workout_tracker.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub token_path: Option<PathBuf>,
    pub timer_presets: Vec<u32>,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            token_path: None,
            timer_presets: vec![60, 120, 180],
            request_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Config file (if any) first, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let config = Self::from_file(&path)?.with_overrides(|key| env::var(key).ok());
        log::info!("Using backend at {}", config.api_base_url);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_VAR).filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(path) = lookup(TOKEN_PATH_VAR).filter(|path| !path.is_empty()) {
            self.token_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Where the login token is kept between runs. `None` when the platform
    /// has no data directory; the token then only lives for the session.
    pub fn resolved_token_path(&self) -> Option<PathBuf> {
        self.token_path
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("workout-tracker").join("token")))
    }

    pub fn presets(&self) -> Vec<u32> {
        let presets: Vec<u32> = self
            .timer_presets
            .iter()
            .copied()
            .filter(|secs| *secs > 0)
            .collect();
        if presets.is_empty() {
            vec![DEFAULT_PRESET_SECS]
        } else {
            presets
        }
    }
}
