//! Platform abstraction layer.
//!
//! The built-in checks reach hardware only through these traits:
//! - I2C bus presence probing
//! - GPIO line write/read-back
//! - video4linux device attributes
//!
//! [`Hardware::system`] wires the Linux implementations; tests substitute
//! simulated ones.

pub mod gpio;
pub mod host;
pub mod i2c;
pub mod video;

pub use gpio::{GpioController, LinuxGpio};
pub use i2c::{I2cBus, LinuxI2c};
pub use video::{SysfsVideo, VideoDevices};

use std::sync::Arc;

/// Errors raised by a hardware backend.
///
/// Every variant means the check could not be evaluated, as opposed to a
/// negative result.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The bus, chip or device node cannot be opened
    #[error("{resource} is not available: {reason}")]
    Unavailable { resource: String, reason: String },

    /// The device was opened but an operation on it failed
    #[error("{resource}: {reason}")]
    Device { resource: String, reason: String },

    /// I/O error reading a device attribute
    #[error("I/O error on {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    /// No backend for this platform or build
    #[error("{0} is not supported on this platform")]
    Unsupported(String),
}

/// Hardware backends handed to the built-in providers.
#[derive(Clone)]
pub struct Hardware {
    pub i2c: Arc<dyn I2cBus>,
    pub gpio: Arc<dyn GpioController>,
    pub video: Arc<dyn VideoDevices>,
}

impl Hardware {
    /// Backends for the running system.
    pub fn system() -> Self {
        Hardware {
            i2c: Arc::new(LinuxI2c),
            gpio: Arc::new(LinuxGpio::default()),
            video: Arc::new(SysfsVideo::default()),
        }
    }
}

impl std::fmt::Debug for Hardware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hardware").finish_non_exhaustive()
    }
}
