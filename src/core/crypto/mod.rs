// src/core/crypto/mod.rs
//! Pure cryptographic operations, no I/O, no database
//!
//! All functions work exclusively on in-memory buffers.
mod cipher;
mod keys;
mod wrap;

pub use cipher::{decrypt_content, encrypt_content};
pub use keys::{derive_wrapping_key, generate_content_key, generate_iv, KeySource};
pub use wrap::{content_key_from_slice, unwrap_content_key, wrap_content_key, WrappedKey};
