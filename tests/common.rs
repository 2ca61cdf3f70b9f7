// tests/common.rs
//! Shared test utilities: logging setup and throwaway share environments

#![allow(dead_code)]

use iryshare_core::db::open_index_db_in_memory;
use iryshare_core::{Address, Caller, MemoryStore};
use rusqlite::Connection;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize test-friendly logging; respects RUST_LOG, safe to call repeatedly
pub fn setup() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

pub const ALICE: &str = "0xa11ce00000000000000000000000000000000001";
pub const BOB: &str = "0xb0b0000000000000000000000000000000000002";
pub const CAROL: &str = "0xca40100000000000000000000000000000000003";
pub const MALLORY: &str = "0x3a11020000000000000000000000000000000004";

pub fn addr(raw: &str) -> Address {
    Address::parse(raw).expect("test address")
}

pub fn caller(raw: &str) -> Caller {
    Caller::new(addr(raw))
}

/// In-memory store + index pair
pub struct TestEnv {
    pub store: MemoryStore,
    pub index: Connection,
}

impl TestEnv {
    pub fn new() -> Self {
        setup();
        Self {
            store: MemoryStore::new(),
            index: open_index_db_in_memory().expect("open in-memory index"),
        }
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
