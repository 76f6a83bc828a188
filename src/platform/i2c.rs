//! I2C device presence detection.
//!
//! A device counts as present when it acknowledges an SMBus receive-byte on
//! `/dev/i2c-<bus>`, or when the kernel reports the address busy because a
//! driver already owns it.

use super::HardwareError;

/// Presence detection for 7-bit I2C addresses.
pub trait I2cBus: Send + Sync {
    /// Whether `address` responds on `bus`.
    ///
    /// `Ok(false)` is a definite "nothing there"; `Err` means the bus itself
    /// could not be used.
    fn detect(&self, bus: u32, address: u16) -> Result<bool, HardwareError>;
}

/// Linux `i2c-dev` backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxI2c;

pub fn bus_path(bus: u32) -> String {
    format!("/dev/i2c-{}", bus)
}

impl I2cBus for LinuxI2c {
    #[cfg(all(target_os = "linux", feature = "hardware"))]
    fn detect(&self, bus: u32, address: u16) -> Result<bool, HardwareError> {
        use i2cdev::core::I2CDevice;
        use i2cdev::linux::LinuxI2CDevice;
        use std::io;

        let path = bus_path(bus);
        if !std::path::Path::new(&path).exists() {
            return Err(HardwareError::Unavailable {
                resource: path,
                reason: "no such device node".to_string(),
            });
        }

        match LinuxI2CDevice::new(&path, address) {
            Ok(mut device) => Ok(device.smbus_read_byte().is_ok()),
            Err(e) => {
                let err: io::Error = e.into();
                if err.kind() == io::ErrorKind::ResourceBusy {
                    tracing::debug!(bus, address, "address claimed by a kernel driver");
                    Ok(true)
                } else {
                    Err(HardwareError::Io {
                        resource: path,
                        source: err,
                    })
                }
            }
        }
    }

    #[cfg(not(all(target_os = "linux", feature = "hardware")))]
    fn detect(&self, bus: u32, _address: u16) -> Result<bool, HardwareError> {
        Err(HardwareError::Unsupported(bus_path(bus)))
    }
}
