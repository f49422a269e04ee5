//! One-shot platform initialisation.
//!
//! Mounts the SPIFFS partition that holds the CSV log and the config file,
//! using raw ESP-IDF sys calls.  On the host there is nothing to mount and
//! the functions succeed trivially.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

/// Mount point of the log partition on the device.
pub const LOG_PARTITION_BASE: &str = "/spiffs";

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot platform initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    SpiffsMountFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SpiffsMountFailed(rc) => write!(f, "SPIFFS mount failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── SPIFFS ────────────────────────────────────────────────────

/// Register the SPIFFS partition under [`LOG_PARTITION_BASE`], formatting
/// it on first use.  Calling it again once mounted is a no-op.
#[cfg(feature = "espidf")]
pub fn mount_log_partition() -> Result<(), HwInitError> {
    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: `conf` outlives the call; the base path is a static C string.
    let rc = unsafe { esp_vfs_spiffs_register(&conf) };
    match rc {
        ESP_OK => {
            log::info!("hw_init: SPIFFS mounted at {}", LOG_PARTITION_BASE);
            Ok(())
        }
        ESP_ERR_INVALID_STATE => Ok(()),
        rc => Err(HwInitError::SpiffsMountFailed(rc)),
    }
}

#[cfg(not(feature = "espidf"))]
pub fn mount_log_partition() -> Result<(), HwInitError> {
    log::debug!("hw_init(sim): no partition to mount");
    Ok(())
}

/// `(total, used)` bytes of the log partition.
#[cfg(feature = "espidf")]
pub fn log_partition_usage() -> Option<(u64, u64)> {
    let mut total: usize = 0;
    let mut used: usize = 0;
    // SAFETY: out-pointers are valid locals; a null label selects the
    // default SPIFFS partition.
    let rc = unsafe { esp_spiffs_info(core::ptr::null(), &mut total, &mut used) };
    (rc == ESP_OK).then_some((total as u64, used as u64))
}

#[cfg(not(feature = "espidf"))]
pub fn log_partition_usage() -> Option<(u64, u64)> {
    None
}
