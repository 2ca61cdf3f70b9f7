// src/db/mod.rs
//! Share index database (SQLite)

pub mod index_db_conn;
pub mod index_db_ops;

pub use index_db_conn::{open_index_db, open_index_db_at, open_index_db_in_memory};
pub use index_db_ops::*;
