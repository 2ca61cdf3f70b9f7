// src/store/memory.rs
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use super::{storage_address_for, EnvelopeStore, StorageAddress};
use crate::error::{CoreError, Result};

/// In-process envelope store, shareable across threads
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<StorageAddress, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EnvelopeStore for MemoryStore {
    fn put(&self, bytes: &[u8]) -> Result<StorageAddress> {
        let address = storage_address_for(bytes);
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        objects
            .entry(address.clone())
            .or_insert_with(|| bytes.to_vec());
        debug!(%address, size = bytes.len(), "stored envelope in memory");
        Ok(address)
    }

    fn get(&self, address: &str) -> Result<Vec<u8>> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects
            .get(address)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("envelope {address}")))
    }

    fn contains(&self, address: &str) -> bool {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_is_idempotent_and_get_returns_bytes() {
        let store = MemoryStore::new();
        let a = store.put(b"envelope").unwrap();
        let b = store.put(b"envelope").unwrap();

        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert!(store.contains(&a));
        assert_eq!(store.get(&a).unwrap(), b"envelope");
    }

    #[test]
    fn missing_address_is_not_found() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert!(matches!(store.get("nope"), Err(CoreError::NotFound(_))));
    }
}
