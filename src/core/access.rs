// src/core/access.rs
//! Access updates: grant, revoke, rekey, and the legacy → shared-key upgrade
//!
//! Every update is owner-only and produces a fresh envelope; the input
//! envelope is never modified.

use chrono::Utc;
use tracing::{info, warn};

use crate::address::{Address, Caller};
use crate::core::crypto::{derive_wrapping_key, wrap_content_key, KeySource};
use crate::core::envelope::Envelope;
use crate::core::seal::{clean_recipients, decrypt_as, encrypt_for_recipients, recover_content_key, FileInfo};
use crate::enums::{EnvelopeVersion, KeySourceKind};
use crate::error::{CoreError, Result};

/// Result of an access update
///
/// `changed` lists the addresses actually added or removed. When it is empty
/// (and the update was not a rekey or upgrade) the envelope is the input as is.
#[derive(Debug, Clone)]
pub struct AccessChange {
    pub envelope: Envelope,
    pub changed: Vec<Address>,
}

impl AccessChange {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

fn require_owner(envelope: &Envelope, caller: &Caller) -> Result<()> {
    if caller.address() != envelope.owner() {
        return Err(CoreError::NotOwner {
            owner: envelope.owner().to_string(),
            caller: caller.address().to_string(),
        });
    }
    Ok(())
}

/// Grant access to `addresses`
///
/// Per-recipient envelopes get the existing content key wrapped for each new
/// address; shared-key envelopes just grow their recipient list. Content
/// ciphertext and IV are carried over untouched in both cases.
pub fn add_recipients(envelope: &Envelope, owner: &Caller, addresses: &[Address]) -> Result<AccessChange> {
    envelope.validate()?;
    require_owner(envelope, owner)?;

    let added: Vec<Address> = clean_recipients(owner.address(), addresses)
        .into_iter()
        .filter(|address| !envelope.is_authorized(address))
        .collect();
    if added.is_empty() {
        return Ok(AccessChange {
            envelope: envelope.clone(),
            changed: added,
        });
    }

    let mut next = envelope.clone();
    if envelope.version == EnvelopeVersion::PerRecipient {
        let content_key = recover_content_key(envelope, owner)?;
        let keys = next.encrypted_keys.get_or_insert_with(Default::default);
        for address in &added {
            let kek = derive_wrapping_key(KeySource::Address(address));
            keys.insert(address.clone(), wrap_content_key(&content_key, &kek)?);
        }
    }
    for address in &added {
        if !next.metadata.recipient_addresses.contains(address) {
            next.metadata.recipient_addresses.push(address.clone());
        }
    }
    next.metadata.updated_at = Some(Utc::now());

    info!(
        file = %envelope.metadata.file_name,
        version = %envelope.version,
        added = added.len(),
        "granted access"
    );
    Ok(AccessChange {
        envelope: next,
        changed: added,
    })
}

/// Withdraw access from `addresses`; the owner cannot be removed
///
/// No content is re-encrypted. A removed recipient who kept the content key
/// can still open this and earlier envelopes until [`rekey`] is run.
pub fn remove_recipients(
    envelope: &Envelope,
    owner: &Caller,
    addresses: &[Address],
) -> Result<AccessChange> {
    envelope.validate()?;
    require_owner(envelope, owner)?;

    // a 1.0 key-map entry grants access even when the list omits it
    let removed: Vec<Address> = clean_recipients(owner.address(), addresses)
        .into_iter()
        .filter(|address| {
            envelope.recipients().contains(address) || envelope.is_authorized(address)
        })
        .collect();
    if removed.is_empty() {
        return Ok(AccessChange {
            envelope: envelope.clone(),
            changed: removed,
        });
    }

    let mut next = envelope.clone();
    if let Some(keys) = next.encrypted_keys.as_mut() {
        for address in &removed {
            keys.remove(address);
        }
    }
    next.metadata
        .recipient_addresses
        .retain(|address| !removed.contains(address));
    next.metadata.updated_at = Some(Utc::now());

    warn!(
        file = %envelope.metadata.file_name,
        removed = removed.len(),
        "access removed without re-encryption; rekey to revoke previously shared keys"
    );
    Ok(AccessChange {
        envelope: next,
        changed: removed,
    })
}

/// Re-encrypt under a fresh content key and IV for everyone who can open
/// the envelope today
///
/// The owner's `ownerKeySource` is kept: an address-derived owner entry stays
/// address-derived even when `owner` presents a signature.
pub fn rekey(envelope: &Envelope, owner: &Caller) -> Result<Envelope> {
    require_owner(envelope, owner)?;
    let plaintext = decrypt_as(envelope, owner)?;

    let sealing_owner = match envelope.metadata.owner_key_source {
        KeySourceKind::Signature => owner.clone(),
        KeySourceKind::Address => Caller::new(owner.address().clone()),
    };
    let file = FileInfo::new(
        envelope.metadata.file_name.clone(),
        envelope.metadata.file_type.clone(),
    );
    let mut next = encrypt_for_recipients(
        plaintext.expose_secret(),
        &file,
        &sealing_owner,
        &envelope.granted_recipients(),
        envelope.version,
    )?;
    next.metadata.encrypted_at = envelope.metadata.encrypted_at;
    next.metadata.updated_at = Some(Utc::now());

    info!(file = %envelope.metadata.file_name, "rekeyed envelope");
    Ok(next)
}

/// Convert a legacy per-recipient envelope into a shared-key one
///
/// The content key is unwrapped once through the owner's entry and becomes
/// the shared `decryptionKey`; content is not re-encrypted.
pub fn upgrade_to_shared(envelope: &Envelope, owner: &Caller) -> Result<Envelope> {
    envelope.validate()?;
    require_owner(envelope, owner)?;
    if envelope.version == EnvelopeVersion::SharedKey {
        return Ok(envelope.clone());
    }

    let content_key = recover_content_key(envelope, owner)?;

    let recipients = envelope.granted_recipients();

    let mut next = envelope.clone();
    next.version = EnvelopeVersion::SharedKey;
    next.encrypted_keys = None;
    next.decryption_key = Some(content_key.expose_secret().to_vec());
    next.metadata.decryption_key = None;
    next.metadata.recipient_addresses = recipients;
    next.metadata.owner_key_source = KeySourceKind::Address;
    next.metadata.updated_at = Some(Utc::now());

    info!(file = %envelope.metadata.file_name, "upgraded envelope to shared key");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn caller(s: &str) -> Caller {
        Caller::new(addr(s))
    }

    fn sealed(version: EnvelopeVersion) -> Envelope {
        encrypt_for_recipients(
            b"quarterly numbers",
            &FileInfo::new("q3.xlsx", "application/vnd.ms-excel"),
            &caller("alice"),
            &[addr("bob")],
            version,
        )
        .unwrap()
    }

    #[test]
    fn add_recipients_preserves_ciphertext_in_both_versions() {
        for version in [EnvelopeVersion::PerRecipient, EnvelopeVersion::SharedKey] {
            let original = sealed(version);
            let change = add_recipients(&original, &caller("alice"), &[addr("carol")]).unwrap();

            assert_eq!(change.changed, vec![addr("carol")]);
            assert_eq!(change.envelope.encrypted_data, original.encrypted_data);
            assert_eq!(change.envelope.iv, original.iv);
            assert_eq!(change.envelope.recipients(), &[addr("bob"), addr("carol")]);
            assert!(change.envelope.metadata.updated_at.is_some());

            let plain = decrypt_as(&change.envelope, &caller("carol")).unwrap();
            assert_eq!(plain.expose_secret().as_slice(), b"quarterly numbers");
            // the superseded envelope is untouched
            assert!(decrypt_as(&original, &caller("carol")).is_err());
        }
    }

    #[test]
    fn shared_key_add_does_not_touch_key_material() {
        let original = sealed(EnvelopeVersion::SharedKey);
        let change = add_recipients(&original, &caller("alice"), &[addr("dave")]).unwrap();
        assert_eq!(change.envelope.decryption_key, original.decryption_key);
        assert!(change.envelope.encrypted_keys.is_none());
    }

    #[test]
    fn adding_existing_or_owner_is_noop() {
        let original = sealed(EnvelopeVersion::PerRecipient);
        let change = add_recipients(&original, &caller("alice"), &[addr("bob"), addr("alice")]).unwrap();
        assert!(change.is_noop());
        assert_eq!(change.envelope, original);
    }

    #[test]
    fn only_owner_may_change_access() {
        let original = sealed(EnvelopeVersion::SharedKey);
        let err = add_recipients(&original, &caller("bob"), &[addr("carol")]).unwrap_err();
        assert!(matches!(err, CoreError::NotOwner { .. }));
        assert!(remove_recipients(&original, &caller("bob"), &[addr("bob")]).is_err());
        assert!(rekey(&original, &caller("bob")).is_err());
    }

    #[test]
    fn remove_recipients_denies_future_opens() {
        for version in [EnvelopeVersion::PerRecipient, EnvelopeVersion::SharedKey] {
            let original = sealed(version);
            let change = remove_recipients(&original, &caller("alice"), &[addr("bob"), addr("alice")])
                .unwrap();
            assert_eq!(change.changed, vec![addr("bob")]);
            assert!(change.envelope.recipients().is_empty());
            assert!(matches!(
                decrypt_as(&change.envelope, &caller("bob")),
                Err(CoreError::AccessDenied(_))
            ));
            assert!(decrypt_as(&change.envelope, &caller("alice")).is_ok());
        }
    }

    #[test]
    fn rekey_changes_key_and_keeps_access() {
        let original = sealed(EnvelopeVersion::SharedKey);
        let next = rekey(&original, &caller("alice")).unwrap();

        assert_ne!(next.shared_key(), original.shared_key());
        assert_ne!(next.iv, original.iv);
        assert_eq!(next.metadata.encrypted_at, original.metadata.encrypted_at);
        assert_eq!(next.recipients(), original.recipients());
        let plain = decrypt_as(&next, &caller("bob")).unwrap();
        assert_eq!(plain.expose_secret().as_slice(), b"quarterly numbers");
    }

    #[test]
    fn upgrade_moves_legacy_envelope_to_shared_key() {
        let legacy = sealed(EnvelopeVersion::PerRecipient);
        let upgraded = upgrade_to_shared(&legacy, &caller("alice")).unwrap();

        assert_eq!(upgraded.version, EnvelopeVersion::SharedKey);
        assert!(upgraded.encrypted_keys.is_none());
        assert_eq!(upgraded.encrypted_data, legacy.encrypted_data);
        upgraded.validate().unwrap();

        let plain = decrypt_as(&upgraded, &caller("bob")).unwrap();
        assert_eq!(plain.expose_secret().as_slice(), b"quarterly numbers");

        let again = upgrade_to_shared(&upgraded, &caller("alice")).unwrap();
        assert_eq!(again, upgraded);
    }

    /// Legacy envelope where bob holds a wrapped key but is missing from the list
    fn unlisted_key_holder() -> Envelope {
        let mut envelope = sealed(EnvelopeVersion::PerRecipient);
        envelope.metadata.recipient_addresses.clear();
        let reparsed = Envelope::from_json(&envelope.to_json().unwrap()).unwrap();
        assert!(decrypt_as(&reparsed, &caller("bob")).is_ok());
        reparsed
    }

    #[test]
    fn remove_revokes_key_map_only_recipient() {
        let envelope = unlisted_key_holder();
        let change = remove_recipients(&envelope, &caller("alice"), &[addr("bob")]).unwrap();

        assert_eq!(change.changed, vec![addr("bob")]);
        assert!(!change.is_noop());
        assert!(!change.envelope.encrypted_keys.as_ref().unwrap().contains_key(&addr("bob")));
        assert!(matches!(
            decrypt_as(&change.envelope, &caller("bob")),
            Err(CoreError::AccessDenied(_))
        ));
    }

    #[test]
    fn add_wraps_key_for_listed_recipient_without_one() {
        let mut envelope = sealed(EnvelopeVersion::PerRecipient);
        envelope.metadata.recipient_addresses.push(addr("carol"));
        assert!(decrypt_as(&envelope, &caller("carol")).is_err());

        let change = add_recipients(&envelope, &caller("alice"), &[addr("carol")]).unwrap();
        assert_eq!(change.changed, vec![addr("carol")]);
        assert_eq!(change.envelope.recipients(), &[addr("bob"), addr("carol")]);
        assert!(decrypt_as(&change.envelope, &caller("carol")).is_ok());
    }

    #[test]
    fn rekey_and_upgrade_agree_on_legacy_recipients() {
        let envelope = unlisted_key_holder();

        let upgraded = upgrade_to_shared(&envelope, &caller("alice")).unwrap();
        let rekeyed = rekey(&envelope, &caller("alice")).unwrap();

        assert_eq!(upgraded.recipients(), &[addr("bob")]);
        assert_eq!(rekeyed.recipients(), &[addr("bob")]);
        assert!(decrypt_as(&upgraded, &caller("bob")).is_ok());
        assert!(decrypt_as(&rekeyed, &caller("bob")).is_ok());
    }

    #[test]
    fn rekey_keeps_owner_key_source() {
        let address_sourced = sealed(EnvelopeVersion::PerRecipient);
        let signing_owner = caller("alice").with_signature("0xsig");
        let next = rekey(&address_sourced, &signing_owner).unwrap();
        assert_eq!(next.metadata.owner_key_source, KeySourceKind::Address);
        assert!(decrypt_as(&next, &caller("alice")).is_ok());

        let signature_sourced = encrypt_for_recipients(
            b"x",
            &FileInfo::new("a", "b"),
            &signing_owner,
            &[addr("bob")],
            EnvelopeVersion::PerRecipient,
        )
        .unwrap();
        let next = rekey(&signature_sourced, &signing_owner).unwrap();
        assert_eq!(next.metadata.owner_key_source, KeySourceKind::Signature);
        assert!(matches!(
            decrypt_as(&next, &caller("alice")),
            Err(CoreError::MissingSignature(_))
        ));
    }

    #[test]
    fn upgrade_with_signature_owner_needs_signature() {
        let owner = caller("alice").with_signature("0xsig");
        let legacy = encrypt_for_recipients(
            b"x",
            &FileInfo::new("a", "b"),
            &owner,
            &[],
            EnvelopeVersion::PerRecipient,
        )
        .unwrap();
        assert!(matches!(
            upgrade_to_shared(&legacy, &caller("alice")),
            Err(CoreError::MissingSignature(_))
        ));
        let upgraded = upgrade_to_shared(&legacy, &owner).unwrap();
        assert_eq!(upgraded.metadata.owner_key_source, KeySourceKind::Address);
    }
}
