// src/config/mod.rs
//! Configuration system for iryshare-core
//!
//! Central, lazy-loaded global config with TOML + env overrides.

pub use app::{load, load_from, Config, Paths, Sharing};
pub use defaults::default_data_dir;

mod app;
mod defaults;
