//! Configuration file handling for the catalog CLI.
//!
//! Looks for `.config/catalog.toml` in the current directory or any parent
//! directory. The file is optional.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

const CONFIG_PATH: &str = ".config/catalog.toml";

/// Contents of `.config/catalog.toml`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Used when neither `--database-url` nor `DATABASE_URL` is set.
    pub database_url: Option<String>,

    /// Name of the bookkeeping table for applied migrations.
    pub migrations_table: Option<String>,
}

impl Config {
    pub fn from_toml(content: &str, path: &Utf8Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

/// Load configuration, searching up from the current directory.
///
/// Returns the default configuration if no file is found.
pub fn load() -> Result<(Config, Option<Utf8PathBuf>), ConfigError> {
    let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
    let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(ConfigError::NonUtf8Path)?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Utf8Path) -> Result<(Config, Option<Utf8PathBuf>), ConfigError> {
    let Some(path) = find_config_file(start) else {
        return Ok((Config::default(), None));
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = Config::from_toml(&content, &path)?;

    tracing::debug!(%path, "loaded config");
    Ok((config, Some(path)))
}

/// Find `.config/catalog.toml` by searching up the directory tree.
fn find_config_file(start: &Utf8Path) -> Option<Utf8PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_PATH))
        .find(|path| path.is_file())
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("current directory is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(std::path::PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
