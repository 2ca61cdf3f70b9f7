// src/share.rs
//! Top-level sharing workflows
//!
//! These coordinate the in-memory crypto, the envelope store and the share
//! index: encrypt → upload → record on the way in, fetch → decrypt on the
//! way out, and fetch → update → re-upload → supersede for access changes.

use std::path::Path;

use rusqlite::Connection;
use tracing::info;

use crate::address::{Address, Caller};
use crate::aliases::PlainText;
use crate::core::{
    add_recipients, decrypt_as, encrypt_for_recipients, file_info_for, rekey, remove_recipients,
    share_id, upgrade_to_shared, AccessChange, Envelope, FileInfo,
};
use crate::db::{self, NewShare};
use crate::enums::{EnvelopeVersion, Progress};
use crate::error::{CoreError, Result};
use crate::store::{EnvelopeStore, StorageAddress};

/// A freshly shared file
#[derive(Debug, Clone)]
pub struct SharedFile {
    pub file_id: String,
    pub storage_address: StorageAddress,
    pub envelope: Envelope,
}

/// Outcome of an access change on a shared file
///
/// `history_version` is `None` when nothing changed and nothing was uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareUpdate {
    pub storage_address: StorageAddress,
    pub history_version: Option<i64>,
    pub changed: Vec<Address>,
}

/// Encrypt bytes for `recipients`, upload the envelope, index the share
pub fn share_bytes<S: EnvelopeStore>(
    store: &S,
    index: &mut Connection,
    plaintext: &[u8],
    file: &FileInfo,
    owner: &Caller,
    recipients: &[Address],
    version: EnvelopeVersion,
) -> Result<SharedFile> {
    share_bytes_with_progress(store, index, plaintext, file, owner, recipients, version, &mut |_| {})
}

#[allow(clippy::too_many_arguments)]
pub fn share_bytes_with_progress<S: EnvelopeStore>(
    store: &S,
    index: &mut Connection,
    plaintext: &[u8],
    file: &FileInfo,
    owner: &Caller,
    recipients: &[Address],
    version: EnvelopeVersion,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<SharedFile> {
    let file_id = share_id(owner.address(), plaintext);
    if db::get_share(index, &file_id)?.is_some() {
        return Err(CoreError::AlreadyShared(file_id));
    }

    on_progress(Progress::Encrypting);
    if version == EnvelopeVersion::PerRecipient {
        on_progress(Progress::WrappingKeys);
    }
    let envelope = encrypt_for_recipients(plaintext, file, owner, recipients, version)?;

    on_progress(Progress::Uploading);
    let storage_address = store.put(&envelope.to_json()?)?;

    on_progress(Progress::Recording);
    db::record_share(
        index,
        &NewShare {
            file_id: &file_id,
            owner_address: owner.address(),
            file_name: &file.file_name,
            file_type: &file.file_type,
            plaintext_size: plaintext.len() as u64,
            envelope_version: version,
            storage_address: &storage_address,
            recipients: envelope.recipients(),
        },
    )?;
    on_progress(Progress::Done);

    info!(
        %file_id,
        %storage_address,
        %version,
        recipients = envelope.recipients().len(),
        "shared file"
    );
    Ok(SharedFile {
        file_id,
        storage_address,
        envelope,
    })
}

/// [`share_bytes`] for a file on disk; name and MIME type come from the path
pub fn share_file<S: EnvelopeStore, P: AsRef<Path>>(
    store: &S,
    index: &mut Connection,
    path: P,
    owner: &Caller,
    recipients: &[Address],
    version: EnvelopeVersion,
) -> Result<SharedFile> {
    let file = file_info_for(path.as_ref())?;
    let plaintext = PlainText::new(std::fs::read(path.as_ref())?);
    share_bytes(
        store,
        index,
        plaintext.expose_secret(),
        &file,
        owner,
        recipients,
        version,
    )
}

/// Download and parse the live envelope of `file_id`
pub fn fetch_envelope<S: EnvelopeStore>(store: &S, index: &Connection, file_id: &str) -> Result<Envelope> {
    let address = db::current_address(index, file_id)?
        .ok_or_else(|| CoreError::NotFound(format!("share {file_id}")))?;
    Envelope::from_json(&store.get(&address)?)
}

pub fn open_shared<S: EnvelopeStore>(
    store: &S,
    index: &Connection,
    file_id: &str,
    caller: &Caller,
) -> Result<PlainText> {
    open_shared_with_progress(store, index, file_id, caller, &mut |_| {})
}

pub fn open_shared_with_progress<S: EnvelopeStore>(
    store: &S,
    index: &Connection,
    file_id: &str,
    caller: &Caller,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<PlainText> {
    on_progress(Progress::Fetching);
    let envelope = fetch_envelope(store, index, file_id)?;

    on_progress(Progress::Decrypting);
    let plaintext = decrypt_as(&envelope, caller)?;

    on_progress(Progress::Done);
    Ok(plaintext)
}

/// Upload a superseding envelope and move the index to it
fn supersede<S: EnvelopeStore>(
    store: &S,
    index: &mut Connection,
    file_id: &str,
    envelope: &Envelope,
    note: &str,
) -> Result<(StorageAddress, i64)> {
    let storage_address = store.put(&envelope.to_json()?)?;
    let version = db::record_envelope_update(
        index,
        file_id,
        &storage_address,
        envelope.version,
        envelope.recipients(),
        Some(note),
    )?;
    info!(%file_id, %storage_address, history_version = version, note, "superseded envelope");
    Ok((storage_address, version))
}

fn apply_change<S: EnvelopeStore>(
    store: &S,
    index: &mut Connection,
    file_id: &str,
    change: AccessChange,
    note: &str,
) -> Result<ShareUpdate> {
    if change.is_noop() {
        let storage_address = db::current_address(index, file_id)?
            .ok_or_else(|| CoreError::NotFound(format!("share {file_id}")))?;
        return Ok(ShareUpdate {
            storage_address,
            history_version: None,
            changed: change.changed,
        });
    }

    let (storage_address, version) = supersede(store, index, file_id, &change.envelope, note)?;
    Ok(ShareUpdate {
        storage_address,
        history_version: Some(version),
        changed: change.changed,
    })
}

/// Give `addresses` access to a shared file
pub fn grant_access<S: EnvelopeStore>(
    store: &S,
    index: &mut Connection,
    file_id: &str,
    owner: &Caller,
    addresses: &[Address],
) -> Result<ShareUpdate> {
    let envelope = fetch_envelope(store, index, file_id)?;
    let change = add_recipients(&envelope, owner, addresses)?;
    apply_change(store, index, file_id, change, "grant")
}

/// Take access away from `addresses` (no re-encryption; see [`rekey_share`])
pub fn revoke_access<S: EnvelopeStore>(
    store: &S,
    index: &mut Connection,
    file_id: &str,
    owner: &Caller,
    addresses: &[Address],
) -> Result<ShareUpdate> {
    let envelope = fetch_envelope(store, index, file_id)?;
    let change = remove_recipients(&envelope, owner, addresses)?;
    apply_change(store, index, file_id, change, "revoke")
}

/// Re-encrypt a shared file under a fresh content key
pub fn rekey_share<S: EnvelopeStore>(
    store: &S,
    index: &mut Connection,
    file_id: &str,
    owner: &Caller,
) -> Result<ShareUpdate> {
    let envelope = fetch_envelope(store, index, file_id)?;
    let next = rekey(&envelope, owner)?;
    let (storage_address, version) = supersede(store, index, file_id, &next, "rekey")?;
    Ok(ShareUpdate {
        storage_address,
        history_version: Some(version),
        changed: Vec::new(),
    })
}

/// Move a legacy per-recipient share to the shared-key format
pub fn upgrade_share<S: EnvelopeStore>(
    store: &S,
    index: &mut Connection,
    file_id: &str,
    owner: &Caller,
) -> Result<ShareUpdate> {
    let envelope = fetch_envelope(store, index, file_id)?;
    let next = upgrade_to_shared(&envelope, owner)?;
    if envelope.version == EnvelopeVersion::SharedKey {
        return apply_change(
            store,
            index,
            file_id,
            AccessChange {
                envelope: next,
                changed: Vec::new(),
            },
            "upgrade",
        );
    }

    let (storage_address, version) = supersede(store, index, file_id, &next, "upgrade")?;
    Ok(ShareUpdate {
        storage_address,
        history_version: Some(version),
        changed: Vec::new(),
    })
}
