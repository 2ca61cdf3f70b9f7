// src/aliases.rs
//! Re-exports secure-gate's ergonomic secret types
//!
//! These are the canonical secret types used throughout iryshare-core.

pub use secure_gate::{dynamic_alias, fixed_alias};

// Fixed-size secrets
fixed_alias!(ContentKey32, 32); // per-file AES-256-GCM content key
fixed_alias!(WrappingKey32, 32); // SHA-256(address | signature) key-encryption key

// Dynamic secrets
dynamic_alias!(PlainText, Vec<u8>);
