// src/store/mod.rs
//! Content-addressed envelope storage
//!
//! Stand-in for the decentralized storage network: envelopes are put once,
//! addressed by a digest of their bytes, and never mutated afterwards.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::consts::STORAGE_ADDRESS_LEN;
use crate::error::{CoreError, Result};

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

/// Address an uploaded envelope can be fetched back from
pub type StorageAddress = String;

pub trait EnvelopeStore {
    /// Store `bytes`; storing identical bytes again returns the same address
    fn put(&self, bytes: &[u8]) -> Result<StorageAddress>;

    /// Fetch previously stored bytes, `NotFound` if absent
    fn get(&self, address: &str) -> Result<Vec<u8>>;

    fn contains(&self, address: &str) -> bool;
}

impl<S: EnvelopeStore + ?Sized> EnvelopeStore for &S {
    fn put(&self, bytes: &[u8]) -> Result<StorageAddress> {
        (**self).put(bytes)
    }

    fn get(&self, address: &str) -> Result<Vec<u8>> {
        (**self).get(address)
    }

    fn contains(&self, address: &str) -> bool {
        (**self).contains(address)
    }
}

/// base64url (no padding) of SHA-256 over the stored bytes
pub fn storage_address_for(bytes: &[u8]) -> StorageAddress {
    URL_SAFE_NO_PAD.encode(Sha256::digest(bytes))
}

/// Reject anything that could not have come from [`storage_address_for`]
pub fn check_storage_address(address: &str) -> Result<()> {
    let well_formed = address.len() == STORAGE_ADDRESS_LEN
        && address
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::NotFound(format!("invalid storage address {address:?}")))
    }
}
