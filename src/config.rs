use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "s3-explorer.log";
const DEFAULT_ERROR_DISPLAY_MS: u64 = 2000;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub download_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub error_display_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: None,
            region: None,
            endpoint_url: None,
            force_path_style: false,
            download_dir: PathBuf::from("."),
            log_file: None,
            error_display_ms: DEFAULT_ERROR_DISPLAY_MS,
        }
    }
}

impl Config {
    /// Loads `path`, or the platform config file when `path` is `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match project_dirs() {
                Some(dirs) => dirs.config_dir().join(CONFIG_FILE),
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }

    pub fn log_path(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join(LOG_FILE))
            .unwrap_or_else(|| PathBuf::from(LOG_FILE))
    }

    pub fn download_path(&self, file_name: &str) -> PathBuf {
        self.download_dir.join(file_name)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "s3-explorer", "s3-explorer")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.error_display(), Duration::from_secs(2));
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "region": "eu-west-1", "download_dir": "/tmp/dl", "error_display_ms": 500 }"#,
        )
        .unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.download_dir, PathBuf::from("/tmp/dl"));
        assert_eq!(config.error_display(), Duration::from_millis(500));
        assert!(config.profile.is_none());
        assert!(!config.force_path_style);
        assert_eq!(
            config.download_path("a.txt"),
            PathBuf::from("/tmp/dl").join("a.txt")
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn explicit_log_file_wins() {
        let config = Config {
            log_file: Some(PathBuf::from("/var/log/explorer.log")),
            ..Config::default()
        };
        assert_eq!(config.log_path(), PathBuf::from("/var/log/explorer.log"));
    }
}
