//! File-backed [`LogStore`].
//!
//! On the device the path points into the SPIFFS partition
//! (`/spiffs/templog.csv`) and capacity comes from the filesystem.  On the
//! host it is a plain file; the reported capacity is the configured
//! partition size with usage taken from the file itself.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use log::{debug, info};

use crate::app::ports::{LogStore, StorageCapacity, StorageError};
use crate::drivers::hw_init;

pub struct FileLogStore {
    path: PathBuf,
    capacity_bytes: u64,
    mounted: bool,
}

impl FileLogStore {
    pub fn new(path: impl Into<PathBuf>, capacity_bytes: u64) -> Self {
        Self {
            path: path.into(),
            capacity_bytes,
            mounted: false,
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

fn map_io(e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        ErrorKind::StorageFull => StorageError::Full,
        _ => StorageError::IoError,
    }
}

impl LogStore for FileLogStore {
    fn mount(&mut self) -> Result<(), StorageError> {
        hw_init::mount_log_partition().map_err(|e| {
            log::warn!("FileLogStore: {}", e);
            StorageError::NotMounted
        })?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(map_io)?;
        }
        self.mounted = true;
        info!("FileLogStore: {}", self.path.display());
        Ok(())
    }

    fn truncate(&mut self) -> Result<(), StorageError> {
        self.check_mounted()?;
        fs::File::create(&self.path).map_err(map_io)?;
        Ok(())
    }

    fn append(&mut self, data: &[u8]) -> Result<(), StorageError> {
        self.check_mounted()?;
        if self.size() + data.len() as u64 > self.capacity_bytes {
            return Err(StorageError::Full);
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(map_io)?;
        file.write_all(data).map_err(map_io)
    }

    fn size(&self) -> u64 {
        fs::metadata(&self.path).map_or(0, |m| m.len())
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn read_all(&self) -> Result<Vec<u8>, StorageError> {
        self.check_mounted()?;
        fs::read(&self.path).map_err(map_io)
    }

    fn remove(&mut self) -> Result<(), StorageError> {
        self.check_mounted()?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("FileLogStore: nothing to remove");
                Ok(())
            }
            Err(e) => Err(map_io(e)),
        }
    }

    fn capacity(&self) -> Option<StorageCapacity> {
        if !self.mounted {
            return None;
        }
        let (total_bytes, used_bytes) =
            hw_init::log_partition_usage().unwrap_or((self.capacity_bytes, self.size()));
        Some(StorageCapacity {
            total_bytes,
            used_bytes,
        })
    }
}
