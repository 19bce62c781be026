// Configuration IO: file discovery and YAML loading.

use std::path::{Path, PathBuf};

use bash_scanner_core::{CategoryConfig, Config, LoadError};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Environment variable naming an explicit safety config file.
pub const CONFIG_ENV: &str = "BASH_SCANNER_CONFIG";
/// Safety config file name, looked up in the project dir then the home dir.
pub const CONFIG_FILE_NAME: &str = ".bash-scanner.yaml";
/// Category config file name, looked up in the project dir then the home dir.
pub const CATEGORY_FILE_NAME: &str = ".bash-categories.yaml";

const DEFAULT_CATEGORY_CONFIG: &str = include_str!("category_config.yaml");

/// Load the safety config.
///
/// If `override_path` is provided it must load, otherwise the error is
/// returned. Without it the chain is `$BASH_SCANNER_CONFIG`, then
/// `<project_dir>/.bash-scanner.yaml`, then `~/.bash-scanner.yaml`; missing
/// or unreadable files are skipped and the empty default is used last.
pub fn load_config(project_dir: &Path, override_path: Option<&Path>) -> Result<Config, LoadError> {
    if let Some(path) = override_path {
        return load_config_file(path);
    }
    Ok(first_loadable(&config_candidates(project_dir, CONFIG_FILE_NAME, true)).unwrap_or_default())
}

/// Load and parse a safety config file at the given path.
pub fn load_config_file(path: &Path) -> Result<Config, LoadError> {
    load_yaml(path)
}

/// Load the category config: `<project_dir>/.bash-categories.yaml`, then
/// `~/.bash-categories.yaml`, then the embedded default table.
pub fn load_category_config(project_dir: &Path) -> CategoryConfig {
    first_loadable(&config_candidates(project_dir, CATEGORY_FILE_NAME, false))
        .unwrap_or_else(default_category_config)
}

/// Load and parse a category config file at the given path.
pub fn load_category_config_file(path: &Path) -> Result<CategoryConfig, LoadError> {
    load_yaml(path)
}

/// The category table compiled into the binary.
pub fn default_category_config() -> CategoryConfig {
    serde_yaml::from_str(DEFAULT_CATEGORY_CONFIG).unwrap_or_else(|e| {
        warn!(error = %e, "embedded category config is invalid");
        CategoryConfig::default()
    })
}

/// Candidate files in lookup order.
fn config_candidates(project_dir: &Path, file_name: &str, with_env: bool) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if with_env && let Ok(p) = std::env::var(CONFIG_ENV) {
        paths.push(PathBuf::from(p));
    }
    if !project_dir.as_os_str().is_empty() {
        paths.push(project_dir.join(file_name));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(file_name));
    }
    paths
}

/// Load the first candidate that exists and parses.
fn first_loadable<T: DeserializeOwned + Default>(candidates: &[PathBuf]) -> Option<T> {
    candidates.iter().find_map(|path| {
        if !path.exists() {
            debug!(path = %path.display(), "config not found");
            return None;
        }
        match load_yaml(path) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping config");
                None
            }
        }
    })
}

fn load_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // An empty document is an empty config.
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&content).map_err(|source| LoadError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
