// src/enums.rs
//! Public enum types used throughout the crate
//!
//! Central location for the enums that appear on the wire or in config:
//! envelope versions, owner key sources, workflow progress.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{VERSION_PER_RECIPIENT, VERSION_SHARED_KEY};
use crate::error::CoreError;

/// Envelope format versions
///
/// `PerRecipient` wraps the content key once per authorized address.
/// `SharedKey` carries a single decryption key and gates access on the
/// recipient list alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EnvelopeVersion {
    #[serde(rename = "1.0")]
    PerRecipient,
    #[default]
    #[serde(rename = "2.0")]
    SharedKey,
}

impl EnvelopeVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeVersion::PerRecipient => VERSION_PER_RECIPIENT,
            EnvelopeVersion::SharedKey => VERSION_SHARED_KEY,
        }
    }
}

impl fmt::Display for EnvelopeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvelopeVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            VERSION_PER_RECIPIENT => Ok(EnvelopeVersion::PerRecipient),
            VERSION_SHARED_KEY => Ok(EnvelopeVersion::SharedKey),
            other => Err(CoreError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// What the owner's own wrapping key was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeySourceKind {
    #[default]
    Address,
    Signature,
}

/// Stages reported by the share workflows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Progress {
    Encrypting,
    WrappingKeys,
    Uploading,
    Recording,
    Fetching,
    Decrypting,
    Done,
}
