// src/core/seal.rs
//! encrypt-for-recipients and decrypt-as

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::debug;

use crate::address::{Address, Caller};
use crate::aliases::{ContentKey32, PlainText};
use crate::consts::ENVELOPE_ALGORITHM;
use crate::core::crypto::{
    content_key_from_slice, decrypt_content, derive_wrapping_key, encrypt_content,
    generate_content_key, generate_iv, unwrap_content_key, wrap_content_key, KeySource,
    WrappedKey,
};
use crate::core::envelope::{Envelope, Metadata};
use crate::enums::{EnvelopeVersion, KeySourceKind};
use crate::error::{CoreError, Result};

/// Name and MIME type recorded in the envelope metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub file_name: String,
    pub file_type: String,
}

impl FileInfo {
    pub fn new(file_name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: file_type.into(),
        }
    }
}

/// Recipients minus duplicates and minus the owner, order preserved
pub(crate) fn clean_recipients(owner: &Address, recipients: &[Address]) -> Vec<Address> {
    let mut out: Vec<Address> = Vec::with_capacity(recipients.len());
    for address in recipients {
        if address != owner && !out.contains(address) {
            out.push(address.clone());
        }
    }
    out
}

/// Wrapping-key source for the owner's own entry
pub(crate) fn owner_key_source(owner: &Caller) -> KeySourceKind {
    if owner.signature().is_some() {
        KeySourceKind::Signature
    } else {
        KeySourceKind::Address
    }
}

/// Build the per-address key map for a legacy envelope
pub(crate) fn wrap_for_all(
    content_key: &ContentKey32,
    owner: &Caller,
    recipients: &[Address],
) -> Result<BTreeMap<Address, WrappedKey>> {
    let mut keys = BTreeMap::new();

    let owner_kek = match owner.signature() {
        Some(signature) => derive_wrapping_key(KeySource::Signature(signature)),
        None => derive_wrapping_key(KeySource::Address(owner.address())),
    };
    keys.insert(
        owner.address().clone(),
        wrap_content_key(content_key, &owner_kek)?,
    );

    for recipient in recipients {
        let kek = derive_wrapping_key(KeySource::Address(recipient));
        keys.insert(recipient.clone(), wrap_content_key(content_key, &kek)?);
    }
    Ok(keys)
}

/// Encrypt file bytes once and grant the owner plus `recipients` access
pub fn encrypt_for_recipients(
    plaintext: &[u8],
    file: &FileInfo,
    owner: &Caller,
    recipients: &[Address],
    version: EnvelopeVersion,
) -> Result<Envelope> {
    let recipients = clean_recipients(owner.address(), recipients);
    let content_key = generate_content_key();
    let iv = generate_iv();
    let encrypted_data = encrypt_content(&content_key, &iv, plaintext)?;

    let (encrypted_keys, decryption_key, key_source) = match version {
        EnvelopeVersion::PerRecipient => (
            Some(wrap_for_all(&content_key, owner, &recipients)?),
            None,
            owner_key_source(owner),
        ),
        EnvelopeVersion::SharedKey => (
            None,
            Some(content_key.expose_secret().to_vec()),
            KeySourceKind::Address,
        ),
    };

    debug!(
        file = %file.file_name,
        %version,
        recipients = recipients.len(),
        "sealed file"
    );

    Ok(Envelope {
        encrypted_data,
        iv: iv.to_vec(),
        algorithm: ENVELOPE_ALGORITHM.to_string(),
        encrypted_keys,
        decryption_key,
        metadata: Metadata {
            file_name: file.file_name.clone(),
            file_type: file.file_type.clone(),
            owner_address: owner.address().clone(),
            recipient_addresses: recipients,
            encrypted_at: Utc::now(),
            updated_at: None,
            file_size: Some(plaintext.len() as u64),
            owner_key_source: key_source,
            decryption_key: None,
        },
        version,
    })
}

/// Unwrap (or look up) the content key on behalf of `caller`
pub fn recover_content_key(envelope: &Envelope, caller: &Caller) -> Result<ContentKey32> {
    let address = caller.address();
    if !envelope.is_authorized(address) {
        return Err(CoreError::AccessDenied(address.to_string()));
    }

    match envelope.version {
        EnvelopeVersion::SharedKey => {
            let shared = envelope
                .shared_key()
                .ok_or_else(|| CoreError::MalformedEnvelope("missing decryptionKey".into()))?;
            content_key_from_slice(shared)
        }
        EnvelopeVersion::PerRecipient => {
            let wrapped = envelope
                .encrypted_keys
                .as_ref()
                .and_then(|keys| keys.get(address))
                .ok_or_else(|| CoreError::AccessDenied(address.to_string()))?;

            let signature_owner = address == envelope.owner()
                && envelope.metadata.owner_key_source == KeySourceKind::Signature;
            let kek = if signature_owner {
                let signature = caller
                    .signature()
                    .ok_or_else(|| CoreError::MissingSignature(address.to_string()))?;
                derive_wrapping_key(KeySource::Signature(signature))
            } else {
                derive_wrapping_key(KeySource::Address(address))
            };
            unwrap_content_key(wrapped, &kek)
        }
    }
}

/// Decrypt an envelope as `caller`, or fail with `AccessDenied`
pub fn decrypt_as(envelope: &Envelope, caller: &Caller) -> Result<PlainText> {
    envelope.validate()?;
    let content_key = recover_content_key(envelope, caller)?;
    let plaintext = decrypt_content(&content_key, &envelope.iv, &envelope.encrypted_data)?;
    debug!(file = %envelope.metadata.file_name, caller = %caller.address(), "decrypted file");
    Ok(plaintext)
}
