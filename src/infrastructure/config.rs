//! Configuration file management.
//!
//! Handles loading TOML configuration files and writing the default one.

use std::fs;
use std::path::Path;

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
pub const DEFAULT_CONFIG: &str = r#"# Taxinomos Server Configuration
# Auto-generated - edit as needed

[files]
# Plain-text domain list, one domain per line, optionally followed by its
# registration date ("nic.at 1998-04-01")
domain_file = "domains.txt"

# Persisted position of the next domain to hand out
cursor_file = "domainid.txt"

# Append-only log of submitted measurements
measurement_file = "measurements.json"

[paths]
# Directory relative file paths are resolved against (default: working directory)
# data_dir = "/var/lib/taxinomos"

[links]
# Prefix for each domain's self link
base_url = "https://classify-rest.labs.nic.at/api/v1"

[log]
# Fsync the measurement log after every append
sync_on_append = false
"#;

/// Load configuration.
///
/// An explicitly given path must exist. Without one, the default location is
/// used if present, otherwise built-in defaults.
///
/// # Errors
/// Returns error if the file cannot be read or parsed.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(AppError::Config {
                message: format!("Config file not found: {}", path.display()),
            });
        }
        return load_config_from_file(path);
    }

    let config_path = AppConfig::default_config_path();
    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        tracing::debug!("No config file, using defaults");
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    let config = toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })?;

    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Create the default configuration file if it doesn't exist.
///
/// Returns `true` if a file was written.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %path.display(), "Created default configuration");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.files.cursor_file, PathBuf::from("domainid.txt"));
        assert!(!config.log.sync_on_append);
        assert!(config.paths.data_dir.is_none());
    }

    #[test]
    fn test_ensure_then_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested").join("config.toml");

        assert!(ensure_config_exists(&config_path).unwrap());
        assert!(!ensure_config_exists(&config_path).unwrap());

        let loaded = load_config(Some(&config_path)).unwrap();
        assert_eq!(loaded.files.domain_file, PathBuf::from("domains.txt"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();

        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();

        assert!(matches!(err, AppError::Config { .. }));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[files\ndomain_file = 3").unwrap();

        assert!(load_config_from_file(&config_path).is_err());
    }
}
