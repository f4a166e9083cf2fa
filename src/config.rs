use crate::catalog::ModelSource;
use crate::downloader::DEFAULT_CONCURRENCY;
use crate::error::DownloadError;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for a download run. Values come from defaults, then an optional
/// JSON file, then command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    pub models_root: PathBuf,
    pub source: ModelSource,
    pub enable_proxy: bool,
    pub proxy: Option<String>,
    pub concurrency: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            models_root: PathBuf::from("./models"),
            source: ModelSource::default(),
            enable_proxy: false,
            proxy: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl DownloadConfig {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, DownloadError> {
        let config_path = config_path.as_ref();
        let content = fs::read_to_string(config_path).map_err(|error| DownloadError::Io {
            path: config_path.to_path_buf(),
            error,
        })?;

        let config: DownloadConfig =
            serde_json::from_str(&content).map_err(|e| DownloadError::Config {
                path: config_path.to_path_buf(),
                message: e.to_string(),
            })?;

        if config.concurrency == 0 {
            return Err(DownloadError::Config {
                path: config_path.to_path_buf(),
                message: "concurrency must be at least 1".to_string(),
            });
        }

        info!("Loaded config from {}", config_path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "source": "modelscope.cn", "enable_proxy": true }"#).unwrap();

        let config = DownloadConfig::load_from_path(&path).unwrap();
        assert_eq!(config.source, ModelSource::ModelScope);
        assert!(config.enable_proxy);
        assert_eq!(config.concurrency, 16);
        assert_eq!(config.models_root, PathBuf::from("./models"));
    }

    #[test]
    fn unknown_keys_and_sources_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, r#"{ "threads": 4 }"#).unwrap();
        assert!(matches!(
            DownloadConfig::load_from_path(&path),
            Err(DownloadError::Config { .. })
        ));

        fs::write(&path, r#"{ "source": "example.org" }"#).unwrap();
        assert!(matches!(
            DownloadConfig::load_from_path(&path),
            Err(DownloadError::Config { .. })
        ));

        fs::write(&path, r#"{ "concurrency": 0 }"#).unwrap();
        assert!(matches!(
            DownloadConfig::load_from_path(&path),
            Err(DownloadError::Config { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            DownloadConfig::load_from_path(dir.path().join("absent.json")),
            Err(DownloadError::Io { .. })
        ));
    }
}
