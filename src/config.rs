//! Runtime settings. Values are layered: built-in defaults rooted in the
//! per-user data directory, then an optional `config.toml` next to the
//! database, then `BOOK_CATALOG_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".book-catalog";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "perpustakaan.sqlite";
const LOG_FILE_NAME: &str = "book-catalog.log";
const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "BOOK_CATALOG";

/// File name offered by the export prompt.
pub const DEFAULT_EXPORT_FILE: &str = "data_buku.csv";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub export_file_name: String,
    pub log_path: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info` or
    /// `book_catalog=debug`.
    pub log_filter: String,
}

impl Settings {
    /// Resolve settings for the current user.
    pub fn load() -> Result<Self> {
        let data_dir = data_dir()?;
        Self::load_from(&data_dir)
    }

    /// Resolve settings with `data_dir` as the root for defaults and for the
    /// optional config file.
    pub fn load_from(data_dir: &Path) -> Result<Self> {
        let defaults = Self::with_data_dir(data_dir);

        let cfg = config::Config::builder()
            .set_default("database_path", path_string(&defaults.database_path))?
            .set_default("export_file_name", defaults.export_file_name)?
            .set_default("log_path", path_string(&defaults.log_path))?
            .set_default("log_filter", defaults.log_filter)?
            .add_source(config::File::from(data_dir.join(CONFIG_FILE_NAME)).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(false))
            .build()
            .context("failed to build configuration")?;

        cfg.try_deserialize()
            .context("failed to deserialize configuration")
    }

    /// Built-in defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            database_path: data_dir.join(DB_FILE_NAME),
            export_file_name: DEFAULT_EXPORT_FILE.to_string(),
            log_path: data_dir.join(LOG_FILE_NAME),
            log_filter: "info".to_string(),
        }
    }
}

/// Absolute path of the per-user data directory.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
