//! In-memory [`LogStore`] for tests and storage-less hosts.
//!
//! Behaves like a flash partition of fixed capacity: an append that would
//! overflow it fails with [`StorageError::Full`].

use crate::app::ports::{LogStore, StorageCapacity, StorageError};

#[derive(Debug)]
pub struct MemoryLogStore {
    data: Option<Vec<u8>>,
    capacity: u64,
    mountable: bool,
    mounted: bool,
}

impl MemoryLogStore {
    pub fn new(capacity: u64) -> Self {
        Self {
            data: None,
            capacity,
            mountable: true,
            mounted: false,
        }
    }

    /// A store whose mount always fails.
    pub fn unmountable() -> Self {
        Self {
            mountable: false,
            ..Self::new(0)
        }
    }

    fn check_mounted(&self) -> Result<(), StorageError> {
        if self.mounted {
            Ok(())
        } else {
            Err(StorageError::NotMounted)
        }
    }
}

impl LogStore for MemoryLogStore {
    fn mount(&mut self) -> Result<(), StorageError> {
        if !self.mountable {
            return Err(StorageError::IoError);
        }
        self.mounted = true;
        Ok(())
    }

    fn truncate(&mut self) -> Result<(), StorageError> {
        self.check_mounted()?;
        self.data = Some(Vec::new());
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        self.check_mounted()?;
        let data = self.data.get_or_insert_with(Vec::new);
        if data.len() as u64 + bytes.len() as u64 > self.capacity {
            return Err(StorageError::Full);
        }
        data.extend_from_slice(bytes);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.as_ref().map_or(0, |d| d.len() as u64)
    }

    fn exists(&self) -> bool {
        self.data.is_some()
    }

    fn read_all(&self) -> Result<Vec<u8>, StorageError> {
        self.check_mounted()?;
        self.data.clone().ok_or(StorageError::NotFound)
    }

    fn remove(&mut self) -> Result<(), StorageError> {
        self.check_mounted()?;
        self.data = None;
        Ok(())
    }

    fn capacity(&self) -> Option<StorageCapacity> {
        self.mounted.then(|| StorageCapacity {
            total_bytes: self.capacity,
            used_bytes: self.size(),
        })
    }
}
