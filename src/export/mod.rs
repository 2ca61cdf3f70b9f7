// src/export/mod.rs
//! Export utilities for iryshare-core
//!
//! Portable dumps of the share index. Only JSON for now.

pub use json::export_to_json;

pub mod json;
