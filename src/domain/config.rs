//! Configuration model.
//!
//! Every field has a default so a partial (or absent) config file is valid.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Locations of the files the dispenser reads and writes.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    /// Plain-text domain list, one domain per line.
    #[serde(default = "default_domain_file")]
    pub domain_file: PathBuf,

    /// File holding the persisted cursor position.
    #[serde(default = "default_cursor_file")]
    pub cursor_file: PathBuf,

    /// Append-only measurement log.
    #[serde(default = "default_measurement_file")]
    pub measurement_file: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            domain_file: default_domain_file(),
            cursor_file: default_cursor_file(),
            measurement_file: default_measurement_file(),
        }
    }
}

fn default_domain_file() -> PathBuf {
    PathBuf::from("domains.txt")
}

fn default_cursor_file() -> PathBuf {
    PathBuf::from("domainid.txt")
}

fn default_measurement_file() -> PathBuf {
    PathBuf::from("measurements.json")
}

/// Path configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathConfig {
    /// Directory relative file paths are resolved against.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Link generation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    /// Base URL prefixed to each resource's self link.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://classify-rest.labs.nic.at/api/v1".to_string()
}

/// Measurement log settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Fsync the measurement log after every append.
    #[serde(default)]
    pub sync_on_append: bool,
}

/// Complete application configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub files: FileConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub links: LinkConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Get the data directory, falling back to the working directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the default directory holding the config file.
    #[must_use]
    pub fn default_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".taxinomos")
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Resolved domain list path.
    #[must_use]
    pub fn domain_file(&self) -> PathBuf {
        self.resolve(&self.files.domain_file)
    }

    /// Resolved cursor file path.
    #[must_use]
    pub fn cursor_file(&self) -> PathBuf {
        self.resolve(&self.files.cursor_file)
    }

    /// Resolved measurement log path.
    #[must_use]
    pub fn measurement_file(&self) -> PathBuf {
        self.resolve(&self.files.measurement_file)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir().join(path)
        }
    }
}
