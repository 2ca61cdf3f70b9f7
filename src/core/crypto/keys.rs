// src/core/crypto/keys.rs
//! Content-key and IV generation, wrapping-key derivation

use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::aliases::{ContentKey32, WrappingKey32};
use crate::consts::{IV_LEN, KEY_LEN};

/// Generate a new random 256-bit content key
#[inline]
pub fn generate_content_key() -> ContentKey32 {
    ContentKey32::new(rand::random::<[u8; KEY_LEN]>())
}

/// Generate a new random 96-bit AES-GCM IV
#[inline]
pub fn generate_iv() -> [u8; IV_LEN] {
    rand::random::<[u8; IV_LEN]>()
}

/// Material a wrapping key is derived from
#[derive(Clone, Copy)]
pub enum KeySource<'a> {
    Address(&'a Address),
    Signature(&'a str),
}

/// SHA-256 of the (already lowercased) address, or of the trimmed signature
pub fn derive_wrapping_key(source: KeySource<'_>) -> WrappingKey32 {
    let material = match source {
        KeySource::Address(address) => address.as_str(),
        KeySource::Signature(signature) => signature.trim(),
    };
    let digest: [u8; KEY_LEN] = Sha256::digest(material.as_bytes()).into();
    WrappingKey32::new(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_keys_and_ivs_are_random() {
        let a = generate_content_key();
        let b = generate_content_key();
        assert_ne!(a.expose_secret(), b.expose_secret());
        assert_ne!(generate_iv(), generate_iv());
    }

    #[test]
    fn address_derivation_ignores_input_case() {
        let upper = Address::parse("0xABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
        let lower = Address::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert_eq!(
            derive_wrapping_key(KeySource::Address(&upper)).expose_secret(),
            derive_wrapping_key(KeySource::Address(&lower)).expose_secret()
        );
    }

    #[test]
    fn derivation_is_plain_sha256() {
        let key = derive_wrapping_key(KeySource::Signature("  sig  "));
        let expected: [u8; 32] = Sha256::digest(b"sig").into();
        assert_eq!(key.expose_secret(), &expected);
    }

    #[test]
    fn signature_and_address_keys_differ() {
        let address = Address::parse("alice").unwrap();
        assert_ne!(
            derive_wrapping_key(KeySource::Address(&address)).expose_secret(),
            derive_wrapping_key(KeySource::Signature("0xdeadbeef")).expose_secret()
        );
    }
}
