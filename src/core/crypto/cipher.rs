// src/core/crypto/cipher.rs
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::aliases::{ContentKey32, PlainText};
use crate::consts::IV_LEN;
use crate::error::{CoreError, Result};

fn cipher_for(key: &[u8; 32]) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
}

/// Encrypt plaintext → AES-256-GCM ciphertext with the 16-byte tag appended
pub fn encrypt_content(key: &ContentKey32, iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let ciphertext = cipher_for(key.expose_secret()).encrypt(Nonce::from_slice(iv), plaintext)?;
    Ok(ciphertext)
}

/// Decrypt AES-256-GCM ciphertext → plaintext (in-memory)
pub fn decrypt_content(key: &ContentKey32, iv: &[u8], ciphertext: &[u8]) -> Result<PlainText> {
    if iv.len() != IV_LEN {
        return Err(CoreError::MalformedEnvelope(format!(
            "iv must be {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }
    let plaintext = cipher_for(key.expose_secret())
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(CoreError::Crypto)?;
    Ok(PlainText::new(plaintext))
}

/// Encrypt with an arbitrary 32-byte key under a fresh nonce, returning nonce || ciphertext
pub(crate) fn seal_with_nonce(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>> {
    let nonce: [u8; IV_LEN] = rand::random();
    let ciphertext = cipher_for(key).encrypt(Nonce::from_slice(&nonce), plaintext)?;
    let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Inverse of [`seal_with_nonce`]; caller guarantees `sealed.len() > IV_LEN`
pub(crate) fn open_with_nonce(key: &[u8; 32], sealed: &[u8]) -> Result<Vec<u8>> {
    let (nonce, ciphertext) = sealed.split_at(IV_LEN);
    let plaintext = cipher_for(key).decrypt(Nonce::from_slice(nonce), ciphertext)?;
    Ok(plaintext)
}
