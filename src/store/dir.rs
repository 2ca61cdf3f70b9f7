// src/store/dir.rs
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{check_storage_address, storage_address_for, EnvelopeStore, StorageAddress};
use crate::error::{CoreError, Result};

/// One file per envelope under a root directory
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, address: &str) -> Result<PathBuf> {
        check_storage_address(address)?;
        Ok(self.root.join(format!("{address}.json")))
    }
}

impl EnvelopeStore for DirStore {
    fn put(&self, bytes: &[u8]) -> Result<StorageAddress> {
        let address = storage_address_for(bytes);
        let path = self.path_for(&address)?;
        if path.exists() {
            return Ok(address);
        }

        // write beside the target, then rename into place
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| CoreError::Io(e.error))?;

        debug!(%address, path = %path.display(), "stored envelope on disk");
        Ok(address)
    }

    fn get(&self, address: &str) -> Result<Vec<u8>> {
        let path = self.path_for(address)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CoreError::NotFound(format!("envelope {address}")))
            }
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    fn contains(&self, address: &str) -> bool {
        self.path_for(address).map(|path| path.exists()).unwrap_or(false)
    }
}
