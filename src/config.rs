//! Device settings for Corsair Hydro coolers.
//!
//! Settings come from a JSON file in the user's config directory. The file
//! is only ever read; a missing file means defaults.
//! - Linux: ~/.config/corsair-rust/config.json
//! - Windows: %APPDATA%\corsair-rust\config.json

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::UsbTarget;
use crate::error::{CoolerError, Result};
use crate::protocol::{
    CORSAIR_VID, DEFAULT_INTERFACE, EP_IN, EP_OUT, H80I_V2_PID, ProtocolRevision, StatusLayout,
};

// =============================================================================
// Config Path
// =============================================================================

const APP_NAME: &str = "corsair-rust";
const CONFIG_FILE: &str = "config.json";

/// Get the configuration directory path.
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| CoolerError::Config("Could not find config directory".into()))
}

/// Get the full path to the config file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

// =============================================================================
// Settings
// =============================================================================

/// Everything that may differ between sites or firmware revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoolerSettings {
    pub vendor_id: u16,
    /// Units of the same family have been seen with different product ids,
    /// so this may need correcting per machine.
    pub product_id: u16,
    pub interface: u8,
    pub endpoint_out: u8,
    pub endpoint_in: u8,
    /// Per-transfer timeout.
    pub timeout_ms: u64,
    /// Pause after `INIT` before the device accepts commands.
    pub init_settle_ms: u64,
    /// Pause between a status request and reading the answer.
    pub status_settle_ms: u64,
    /// Response layout to decode status frames with.
    pub revision: ProtocolRevision,
    /// Number of fan headers reported in a status frame.
    pub fan_count: usize,
}

impl Default for CoolerSettings {
    fn default() -> Self {
        Self {
            vendor_id: CORSAIR_VID,
            product_id: H80I_V2_PID,
            interface: DEFAULT_INTERFACE,
            endpoint_out: EP_OUT,
            endpoint_in: EP_IN,
            timeout_ms: 1000,
            init_settle_ms: 500,
            status_settle_ms: 50,
            revision: ProtocolRevision::H80iV2,
            fan_count: 2,
        }
    }
}

impl CoolerSettings {
    /// Load settings from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CoolerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let settings: Self = serde_json::from_str(&content).map_err(|e| {
            CoolerError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        settings.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    /// Load settings from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(CoolerError::Config("timeoutMs must be greater than 0".into()));
        }
        if self.endpoint_in & 0x80 == 0 {
            return Err(CoolerError::Config(format!(
                "endpointIn {:#04x} is not an IN endpoint",
                self.endpoint_in
            )));
        }
        if self.endpoint_out & 0x80 != 0 {
            return Err(CoolerError::Config(format!(
                "endpointOut {:#04x} is not an OUT endpoint",
                self.endpoint_out
            )));
        }
        self.layout()?;
        Ok(())
    }

    pub fn target(&self) -> UsbTarget {
        UsbTarget {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            interface: self.interface,
            endpoint_out: self.endpoint_out,
            endpoint_in: self.endpoint_in,
        }
    }

    pub fn layout(&self) -> Result<StatusLayout> {
        self.revision.layout().with_fan_count(self.fan_count)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn init_settle(&self) -> Duration {
        Duration::from_millis(self.init_settle_ms)
    }

    pub fn status_settle(&self) -> Duration {
        Duration::from_millis(self.status_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::H80I_V2_PID_ALT;

    #[test]
    fn test_defaults() {
        let settings = CoolerSettings::default();
        assert_eq!(settings.vendor_id, 0x1B1C);
        assert_eq!(settings.product_id, 0x0C12);
        assert_eq!(settings.init_settle(), Duration::from_millis(500));
        assert_eq!(settings.status_settle(), Duration::from_millis(50));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CoolerSettings::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(settings, CoolerSettings::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            format!(r#"{{ "productId": {}, "fanCount": 3 }}"#, H80I_V2_PID_ALT),
        )
        .unwrap();

        let settings = CoolerSettings::load_from(&path).unwrap();
        assert_eq!(settings.product_id, 0x0C04);
        assert_eq!(settings.fan_count, 3);
        assert_eq!(settings.timeout_ms, 1000);
        assert_eq!(settings.layout().unwrap().fan_count(), 3);
    }

    #[test]
    fn test_revision_name() {
        let settings: CoolerSettings = serde_json::from_str(r#"{ "revision": "h80i-v2" }"#).unwrap();
        assert_eq!(settings.revision, ProtocolRevision::H80iV2);
    }

    #[test]
    fn test_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{ "timeoutMs": 0 }"#).unwrap();
        assert!(matches!(
            CoolerSettings::load_from(&path),
            Err(CoolerError::Config(_))
        ));

        std::fs::write(&path, r#"{ "fanCount": 40 }"#).unwrap();
        assert!(CoolerSettings::load_from(&path).is_err());

        std::fs::write(&path, r#"{ "endpointIn": 1 }"#).unwrap();
        assert!(CoolerSettings::load_from(&path).is_err());

        std::fs::write(&path, r#"{ "fanCount": 18446744073709551615 }"#).unwrap();
        assert!(matches!(
            CoolerSettings::load_from(&path),
            Err(CoolerError::Config(_))
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(CoolerSettings::load_from(&path).is_err());
    }
}
