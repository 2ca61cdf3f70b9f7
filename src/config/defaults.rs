// src/config/defaults.rs
use std::path::PathBuf;

use crate::config::app::Paths;

pub const APP_DIR_NAME: &str = "iryshare";

/// Per-user data directory, or `./.iryshare` when the platform has none
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{APP_DIR_NAME}")))
}

pub fn default_paths() -> Paths {
    let base = default_data_dir();
    Paths {
        store_dir: base.join("envelopes").to_string_lossy().into_owned(),
        index_db: base.join("index.db").to_string_lossy().into_owned(),
    }
}
