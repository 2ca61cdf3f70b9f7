// src/core/envelope.rs
//! The JSON envelope uploaded to storage
//!
//! An envelope bundles the content ciphertext, the IV, the key material for
//! its version (per-address wrapped keys or a single shared key) and the
//! descriptive metadata. Envelopes are immutable once uploaded; access
//! changes produce a new one.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;
use crate::consts::{ENVELOPE_ALGORITHM, IV_LEN, KEY_LEN};
use crate::core::crypto::WrappedKey;
use crate::enums::{EnvelopeVersion, KeySourceKind};
use crate::error::{CoreError, Result};

/// Descriptive metadata carried inside every envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub file_name: String,
    pub file_type: String,
    pub owner_address: Address,
    #[serde(default)]
    pub recipient_addresses: Vec<Address>,
    pub encrypted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub owner_key_source: KeySourceKind,
    /// Older shared-key envelopes kept the key here instead of at the top level
    #[serde(default, skip_serializing_if = "Option::is_none", with = "b64::option")]
    pub decryption_key: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(with = "b64")]
    pub encrypted_data: Vec<u8>,
    #[serde(with = "b64")]
    pub iv: Vec<u8>,
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_keys: Option<BTreeMap<Address, WrappedKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "b64::option")]
    pub decryption_key: Option<Vec<u8>>,
    pub metadata: Metadata,
    pub version: EnvelopeVersion,
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("version", &self.version)
            .field("algorithm", &self.algorithm)
            .field("encrypted_data_len", &self.encrypted_data.len())
            .field(
                "encrypted_keys",
                &self.encrypted_keys.as_ref().map(|keys| keys.keys().collect::<Vec<_>>()),
            )
            .field("has_shared_key", &self.shared_key().is_some())
            .field("file_name", &self.metadata.file_name)
            .field("owner", &self.metadata.owner_address)
            .field("recipients", &self.metadata.recipient_addresses)
            .finish()
    }
}

impl Envelope {
    pub fn owner(&self) -> &Address {
        &self.metadata.owner_address
    }

    pub fn recipients(&self) -> &[Address] {
        &self.metadata.recipient_addresses
    }

    /// Owner first, then recipients in list order
    pub fn authorized_addresses(&self) -> Vec<Address> {
        std::iter::once(self.owner().clone())
            .chain(self.recipients().iter().cloned())
            .collect()
    }

    /// Everyone besides the owner who can currently open this envelope
    ///
    /// For `1.0` that is whoever holds a wrapped key, which may include
    /// addresses missing from `recipientAddresses`: listed holders come first
    /// in list order, then key-map-only entries. For `2.0` it is the list.
    pub fn granted_recipients(&self) -> Vec<Address> {
        let Some(keys) = self.encrypted_keys.as_ref() else {
            return self.recipients().to_vec();
        };
        let mut granted: Vec<Address> = self
            .recipients()
            .iter()
            .filter(|address| keys.contains_key(*address))
            .cloned()
            .collect();
        for address in keys.keys() {
            if address != self.owner() && !granted.contains(address) {
                granted.push(address.clone());
            }
        }
        granted
    }

    /// The shared content key of a `2.0` envelope, wherever it was stored
    pub fn shared_key(&self) -> Option<&[u8]> {
        self.decryption_key
            .as_deref()
            .or(self.metadata.decryption_key.as_deref())
    }

    pub fn is_authorized(&self, address: &Address) -> bool {
        if address == self.owner() {
            return true;
        }
        match self.version {
            EnvelopeVersion::PerRecipient => self
                .encrypted_keys
                .as_ref()
                .is_some_and(|keys| keys.contains_key(address)),
            EnvelopeVersion::SharedKey => self.recipients().contains(address),
        }
    }

    /// Enforce the per-version key invariants and basic shape
    pub fn validate(&self) -> Result<()> {
        if self.algorithm != ENVELOPE_ALGORITHM {
            return Err(CoreError::UnsupportedAlgorithm(self.algorithm.clone()));
        }
        if self.iv.len() != IV_LEN {
            return Err(malformed(format!("iv must be {IV_LEN} bytes, got {}", self.iv.len())));
        }
        if self.recipients().contains(self.owner()) {
            return Err(malformed("owner listed among recipients"));
        }

        match self.version {
            EnvelopeVersion::PerRecipient => {
                if self.shared_key().is_some() {
                    return Err(malformed("version 1.0 envelope carries a shared key"));
                }
                let keys = self
                    .encrypted_keys
                    .as_ref()
                    .filter(|keys| !keys.is_empty())
                    .ok_or_else(|| malformed("version 1.0 envelope has no encryptedKeys"))?;
                if !keys.contains_key(self.owner()) {
                    return Err(malformed("owner has no wrapped key"));
                }
            }
            EnvelopeVersion::SharedKey => {
                if self.encrypted_keys.is_some() {
                    return Err(malformed("version 2.0 envelope carries encryptedKeys"));
                }
                if self.decryption_key.is_some() && self.metadata.decryption_key.is_some() {
                    return Err(malformed("shared key stored twice"));
                }
                let key = self
                    .shared_key()
                    .ok_or_else(|| malformed("version 2.0 envelope has no decryptionKey"))?;
                if key.len() != KEY_LEN {
                    return Err(malformed(format!(
                        "decryptionKey must be {KEY_LEN} bytes, got {}",
                        key.len()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse and validate; unknown versions surface as `UnsupportedVersion`
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let raw: Value = serde_json::from_slice(bytes)?;
        match raw.get("version") {
            Some(Value::String(version)) => {
                version.parse::<EnvelopeVersion>()?;
            }
            Some(other) => return Err(CoreError::UnsupportedVersion(other.to_string())),
            None => return Err(malformed("missing version")),
        }

        let envelope: Envelope = serde_json::from_value(raw)?;
        envelope.validate()?;
        Ok(envelope)
    }
}

fn malformed(reason: impl Into<String>) -> CoreError {
    CoreError::MalformedEnvelope(reason.into())
}

/// Standard (padded) base64 for byte fields
mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            bytes: &Option<Vec<u8>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match bytes {
                Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Vec<u8>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|encoded| STANDARD.decode(encoded.as_bytes()))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}
