//! Analysis Configuration Module
//! Tunable thresholds and export sizes, loaded from an optional JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV_VAR: &str = "AQI_EXPLORER_CONFIG";
/// File looked up in the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "aqi_explorer.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings shared by the pipeline, the statistics layer and the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Window of the rolling mean, in present days.
    pub rolling_window: usize,
    /// Fewer resampled rows than this raise a sparse-range warning.
    pub sparse_day_threshold: usize,
    /// Number of candidates pre-selected after a file is opened.
    pub default_selection: usize,
    pub export_width: u32,
    pub export_height: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rolling_window: 7,
            sparse_day_threshold: 7,
            default_selection: 3,
            export_width: 1400,
            export_height: 800,
        }
    }
}

impl AnalysisConfig {
    /// Read a config file. Keys that are absent keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the config location and load it, falling back to defaults.
    pub fn load_or_default() -> Self {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config.sanitized()
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Clamp values that would make the analysis meaningless.
    pub fn sanitized(mut self) -> Self {
        self.rolling_window = self.rolling_window.max(1);
        self.export_width = self.export_width.max(200);
        self.export_height = self.export_height.max(150);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_dashboard_thresholds() {
        let config = AnalysisConfig::default();
        assert_eq!(config.rolling_window, 7);
        assert_eq!(config.sparse_day_threshold, 7);
        assert_eq!(config.default_selection, 3);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "rolling_window": 3, "export_width": 900 }}"#).unwrap();

        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.rolling_window, 3);
        assert_eq!(config.export_width, 900);
        assert_eq!(config.sparse_day_threshold, 7);
        assert_eq!(config.export_height, 800);
    }

    #[test]
    fn invalid_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "rolling_window = 3").unwrap();

        let err = AnalysisConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn sanitize_rejects_zero_window() {
        let config = AnalysisConfig {
            rolling_window: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config.rolling_window, 1);
    }
}
