use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::Result;
use crate::store::Store;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "SYMPTO_DATA_DIR";

pub const DB_FILE: &str = "sympto.db";

/// `~/.sympto`, used when `SYMPTO_DATA_DIR` is unset.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".sympto")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// The data directory: `$SYMPTO_DATA_DIR` when set and non-empty, otherwise
/// the default.
pub fn data_dir() -> PathBuf {
    env::var(DATA_DIR_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default_base_dir)
}

/// Open (creating as needed) the database inside `dir`.
pub fn open_in_dir(dir: &Path) -> Result<Store> {
    fs::create_dir_all(dir)?;
    let path = dir.join(DB_FILE);
    tracing::debug!(path = %path.display(), "opening store");
    Store::open(&path)
}
