//! JSON file adapter for the calibration record.
//!
//! Implements [`ConfigPort`] over a single pretty-printed JSON file, by
//! default [`CONFIG_PATH`](crate::config::CONFIG_PATH) on the SPIFFS
//! partition.  The file is meant to be read and edited by hand.
//!
//! - Validation: the record is range-checked before every write and after
//!   every read.
//! - Atomic replace: the new record goes to `<path>.tmp` first and is then
//!   renamed over the old one.  SPIFFS refuses to rename onto an existing
//!   file, so on device the old file is removed first.
//! - A failed save removes `<path>.tmp` only while the old record still
//!   exists.  Once the old record is gone the temporary file is the only
//!   copy; it is kept, and [`ConfigPort::load`] recovers it when `<path>`
//!   is missing.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::ConfigPort;
use crate::config::CalibrationConfig;
use crate::error::ConfigError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Mount point of the data partition.
pub const SPIFFS_BASE_PATH: &str = "/spiffs";

/// Register the SPIFFS partition at [`SPIFFS_BASE_PATH`] with the VFS.
/// Formats the partition on first boot.  Already mounted is not an error.
#[cfg(target_os = "espidf")]
pub fn mount_spiffs() -> Result<(), ConfigError> {
    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: called once from main() before any file access.
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret == ESP_ERR_INVALID_STATE as i32 {
        return Ok(());
    }
    if ret != ESP_OK as i32 {
        warn!("JsonFileStore: SPIFFS mount failed (rc={})", ret);
        return Err(ConfigError::Io);
    }
    info!("JsonFileStore: SPIFFS mounted at {}", SPIFFS_BASE_PATH);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn mount_spiffs() -> Result<(), ConfigError> {
    info!("JsonFileStore(sim): using host filesystem");
    Ok(())
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut p = self.path.clone().into_os_string();
        p.push(".tmp");
        PathBuf::from(p)
    }

    fn replace(&self, tmp: &Path) -> io::Result<()> {
        self.replace_with(tmp, |from, to| fs::rename(from, to))
    }

    fn replace_with(
        &self,
        tmp: &Path,
        mut rename: impl FnMut(&Path, &Path) -> io::Result<()>,
    ) -> io::Result<()> {
        let first = match rename(tmp, &self.path) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        if !self.path.exists() {
            let _ = fs::remove_file(tmp);
            return Err(first);
        }
        if let Err(e) = fs::remove_file(&self.path) {
            let _ = fs::remove_file(tmp);
            return Err(e);
        }
        // Old record removed: `tmp` is now the only copy and must survive.
        rename(tmp, &self.path)
    }

    /// `<path>` is missing: fall back to a temporary copy left behind by an
    /// interrupted replace, and promote it.
    fn recover(&self) -> Result<CalibrationConfig, ConfigError> {
        let tmp = self.tmp_path();
        let text = match fs::read_to_string(&tmp) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("JsonFileStore: no calibration at {}", self.path.display());
                return Err(ConfigError::Missing);
            }
            Err(e) => {
                warn!("JsonFileStore: read {} failed: {}", tmp.display(), e);
                return Err(ConfigError::Io);
            }
        };
        let cfg = CalibrationConfig::from_json(&text)?;
        warn!("JsonFileStore: recovered calibration from {}", tmp.display());
        if let Err(e) = fs::rename(&tmp, &self.path) {
            warn!("JsonFileStore: could not restore {}: {}", self.path.display(), e);
        }
        Ok(cfg)
    }
}

impl ConfigPort for JsonFileStore {
    fn load(&self) -> Result<CalibrationConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return self.recover(),
            Err(e) => {
                warn!("JsonFileStore: read {} failed: {}", self.path.display(), e);
                return Err(ConfigError::Io);
            }
        };
        let cfg = CalibrationConfig::from_json(&text)?;
        info!("JsonFileStore: loaded calibration from {}", self.path.display());
        Ok(cfg)
    }

    fn save(&mut self, config: &CalibrationConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let json = config.to_json()?;
        let tmp = self.tmp_path();

        if let Err(e) = fs::write(&tmp, json.as_bytes()) {
            warn!("JsonFileStore: write {} failed: {}", tmp.display(), e);
            let _ = fs::remove_file(&tmp);
            return Err(ConfigError::Io);
        }
        if let Err(e) = self.replace(&tmp) {
            warn!("JsonFileStore: replace {} failed: {}", self.path.display(), e);
            return Err(ConfigError::Io);
        }

        info!(
            "JsonFileStore: calibration saved to {} ({} bytes)",
            self.path.display(),
            json.len()
        );
        Ok(())
    }
}
