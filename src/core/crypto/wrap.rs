// src/core/crypto/wrap.rs
//! Per-recipient content-key wrapping
//!
//! Wire format of a wrapped key: `nonce(12) || AES-256-GCM(kek, content_key)(32) || tag(16)`.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::cipher::{open_with_nonce, seal_with_nonce};
use crate::aliases::{ContentKey32, WrappingKey32};
use crate::consts::{KEY_LEN, WRAPPED_KEY_LEN};
use crate::error::{CoreError, Result};

/// A content key encrypted under one recipient's wrapping key
#[derive(Clone, PartialEq, Eq)]
pub struct WrappedKey(Vec<u8>);

impl WrappedKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != WRAPPED_KEY_LEN {
            return Err(CoreError::MalformedEnvelope(format!(
                "wrapped key must be {WRAPPED_KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WrappedKey({} bytes)", self.0.len())
    }
}

impl Serialize for WrappedKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for WrappedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)?;
        WrappedKey::from_bytes(bytes).map_err(serde::de::Error::custom)
    }
}

/// Encrypt the raw content key under a derived wrapping key
pub fn wrap_content_key(content_key: &ContentKey32, wrapping_key: &WrappingKey32) -> Result<WrappedKey> {
    let sealed = seal_with_nonce(wrapping_key.expose_secret(), content_key.expose_secret())?;
    WrappedKey::from_bytes(sealed)
}

/// Recover the content key; fails with `Crypto` under the wrong wrapping key
pub fn unwrap_content_key(wrapped: &WrappedKey, wrapping_key: &WrappingKey32) -> Result<ContentKey32> {
    let raw = open_with_nonce(wrapping_key.expose_secret(), wrapped.as_bytes())?;
    content_key_from_slice(&raw)
}

/// Rebuild a content key from raw bytes (shared-key envelopes carry it this way)
pub fn content_key_from_slice(raw: &[u8]) -> Result<ContentKey32> {
    let bytes: [u8; KEY_LEN] = raw.try_into().map_err(|_| {
        CoreError::MalformedEnvelope(format!("content key must be {KEY_LEN} bytes, got {}", raw.len()))
    })?;
    Ok(ContentKey32::new(bytes))
}
