// src/address.rs
//! Wallet addresses and the caller identity presented for decryption

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A normalized (trimmed, lowercased) wallet address
///
/// `0x`-prefixed addresses must carry exactly 40 hex digits. Anything else
/// is treated as an opaque address from another chain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidAddress(raw.to_string()));
        }

        let normalized = trimmed.to_ascii_lowercase();
        if let Some(digits) = normalized.strip_prefix("0x") {
            if digits.len() != 40 || hex::decode(digits).is_err() {
                return Err(CoreError::InvalidAddress(raw.to_string()));
            }
        }

        Ok(Address(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Parse a batch of raw addresses, dropping duplicates but keeping order
pub fn normalize_addresses<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Address>> {
    let mut out: Vec<Address> = Vec::with_capacity(raw.len());
    for item in raw {
        let address = Address::parse(item.as_ref())?;
        if !out.contains(&address) {
            out.push(address);
        }
    }
    Ok(out)
}

/// Who is asking to decrypt or change access
///
/// The optional signature is only consulted when the envelope's owner entry
/// was wrapped under a signature-derived key.
#[derive(Clone)]
pub struct Caller {
    address: Address,
    signature: Option<String>,
}

impl Caller {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            signature: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

impl fmt::Debug for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caller")
            .field("address", &self.address)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
