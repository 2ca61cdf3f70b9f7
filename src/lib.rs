// src/lib.rs
//! iryshare-core: permissioned file sharing with wallet identities
//!
//! Features:
//! - AES-256-GCM content encryption, one random key + IV per file
//! - Content key wrapped per recipient under SHA-256(address | signature)
//! - Legacy per-recipient and current shared-key envelope versions
//! - Access updates without re-encrypting content
//! - Content-addressed envelope storage + SQLite share index

pub mod address;
pub mod aliases;
pub mod config;
pub mod consts;
pub mod core;
pub mod db;
pub mod enums;
pub mod error;
pub mod export;
pub mod share;
pub mod store;

// Re-export everything users need at the crate root
pub use address::{Address, Caller};
pub use aliases::{ContentKey32, PlainText, WrappingKey32};
pub use config::load as load_config;
pub use crate::core::{
    add_recipients, decrypt_as, encrypt_for_recipients, rekey, remove_recipients,
    upgrade_to_shared, AccessChange, Envelope, FileInfo, Metadata,
};
pub use enums::{EnvelopeVersion, KeySourceKind, Progress};
pub use error::{CoreError, Result as CoreResult};
pub use export::export_to_json;
pub use share::{
    grant_access, open_shared, rekey_share, revoke_access, share_bytes, share_file, upgrade_share,
    ShareUpdate, SharedFile,
};
pub use store::{DirStore, EnvelopeStore, MemoryStore};
