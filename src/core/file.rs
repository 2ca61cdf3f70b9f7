// src/core/file.rs
//! File-level seal/open operations
//!
//! This module handles sealing and opening with file I/O,
//! building on the in-memory operations from seal.rs.

use std::path::Path;

use crate::address::{Address, Caller};
use crate::consts::DEFAULT_FILE_TYPE;
use crate::core::envelope::Envelope;
use crate::core::seal::{decrypt_as, encrypt_for_recipients, FileInfo};
use crate::enums::EnvelopeVersion;
use crate::error::{CoreError, Result};

/// File name and guessed MIME type for a path on disk
pub fn file_info_for(path: &Path) -> Result<FileInfo> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| CoreError::NotFound(format!("no file name in {}", path.display())))?;
    let file_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_FILE_TYPE)
        .to_string();
    Ok(FileInfo::new(file_name, file_type))
}

/// Read a file from disk and seal it for `recipients`
pub fn seal_file<P: AsRef<Path>>(
    input_path: P,
    owner: &Caller,
    recipients: &[Address],
    version: EnvelopeVersion,
) -> Result<Envelope> {
    let info = file_info_for(input_path.as_ref())?;
    let plaintext = std::fs::read(input_path.as_ref())?;
    encrypt_for_recipients(&plaintext, &info, owner, recipients, version)
}

/// Decrypt an envelope as `caller` and write the plaintext to disk
///
/// Returns the plaintext size in bytes.
pub fn open_to_file<P: AsRef<Path>>(envelope: &Envelope, caller: &Caller, output_path: P) -> Result<u64> {
    let plaintext = decrypt_as(envelope, caller)?;
    std::fs::write(output_path.as_ref(), plaintext.expose_secret())?;
    Ok(plaintext.expose_secret().len() as u64)
}
