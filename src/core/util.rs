//! Small utility functions used across the core module
//!
//! Currently just the share-id hash.

use blake3::Hasher;

use crate::address::Address;

/// Stable share id: BLAKE3 over owner address and plaintext
pub fn share_id(owner: &Address, plaintext: &[u8]) -> String {
    Hasher::new()
        .update(owner.as_str().as_bytes())
        .update(&[0u8])
        .update(plaintext)
        .finalize()
        .to_hex()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_id_depends_on_owner_and_content() {
        let alice = Address::parse("alice").unwrap();
        let bob = Address::parse("bob").unwrap();

        assert_eq!(share_id(&alice, b"doc"), share_id(&alice, b"doc"));
        assert_ne!(share_id(&alice, b"doc"), share_id(&bob, b"doc"));
        assert_ne!(share_id(&alice, b"doc"), share_id(&alice, b"doc2"));
        assert_eq!(share_id(&alice, b"doc").len(), 64);
        assert_ne!(share_id(&alice, b"doc"), blake3::hash(b"doc").to_hex().to_string());
    }
}
