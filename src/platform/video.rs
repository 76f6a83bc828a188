//! video4linux device attributes from sysfs.
//!
//! For a device node `/dev/videoN` the kernel exposes
//! `/sys/class/video4linux/videoN/name` and a `device/driver` symlink whose
//! target's final component is the bound driver.

use super::HardwareError;
use std::fs;
use std::path::{Path, PathBuf};

pub trait VideoDevices: Send + Sync {
    /// Whether the device node exists.
    fn exists(&self, device: &str) -> bool;
    /// Card name reported by the driver.
    fn name(&self, device: &str) -> Result<String, HardwareError>;
    /// Name of the kernel driver bound to the device.
    fn driver(&self, device: &str) -> Result<String, HardwareError>;
}

/// sysfs-backed implementation. Roots are configurable for tests.
#[derive(Debug, Clone)]
pub struct SysfsVideo {
    class_root: PathBuf,
}

impl Default for SysfsVideo {
    fn default() -> Self {
        SysfsVideo {
            class_root: PathBuf::from("/sys/class/video4linux"),
        }
    }
}

impl SysfsVideo {
    pub fn with_class_root(class_root: impl Into<PathBuf>) -> Self {
        SysfsVideo {
            class_root: class_root.into(),
        }
    }

    fn node_dir(&self, device: &str) -> Result<PathBuf, HardwareError> {
        let node = Path::new(device)
            .file_name()
            .ok_or_else(|| HardwareError::Unavailable {
                resource: device.to_string(),
                reason: "not a device path".to_string(),
            })?;
        Ok(self.class_root.join(node))
    }
}

impl VideoDevices for SysfsVideo {
    fn exists(&self, device: &str) -> bool {
        Path::new(device).exists()
    }

    fn name(&self, device: &str) -> Result<String, HardwareError> {
        let path = self.node_dir(device)?.join("name");
        fs::read_to_string(&path)
            .map(|s| s.trim().to_string())
            .map_err(|e| HardwareError::Io {
                resource: path.display().to_string(),
                source: e,
            })
    }

    fn driver(&self, device: &str) -> Result<String, HardwareError> {
        let link = self.node_dir(device)?.join("device").join("driver");
        let target = fs::read_link(&link).map_err(|e| HardwareError::Io {
            resource: link.display().to_string(),
            source: e,
        })?;
        target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| HardwareError::Device {
                resource: link.display().to_string(),
                reason: "driver link has no target name".to_string(),
            })
    }
}
