//! GPIO line write/read-back through the GPIO character device.

use super::HardwareError;

/// Default chip for lines given without an explicit `chip`.
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

pub trait GpioController: Send + Sync {
    /// Drive `line` on `chip` to `value` and return the level read back.
    fn write_and_read(&self, chip: &str, line: u32, value: bool) -> Result<bool, HardwareError>;
}

/// Linux `gpiochip` backend.
#[derive(Debug, Clone)]
pub struct LinuxGpio {
    consumer: String,
}

impl Default for LinuxGpio {
    fn default() -> Self {
        LinuxGpio {
            consumer: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl GpioController for LinuxGpio {
    #[cfg(all(target_os = "linux", feature = "hardware"))]
    fn write_and_read(&self, chip: &str, line: u32, value: bool) -> Result<bool, HardwareError> {
        use gpiocdev::line::Value;

        let level = if value { Value::Active } else { Value::Inactive };
        let request = gpiocdev::Request::builder()
            .on_chip(chip)
            .with_consumer(self.consumer.as_str())
            .with_line(line)
            .as_output(level)
            .request()
            .map_err(|e| HardwareError::Unavailable {
                resource: format!("{} line {}", chip, line),
                reason: e.to_string(),
            })?;

        let read = request.value(line).map_err(|e| HardwareError::Device {
            resource: format!("{} line {}", chip, line),
            reason: e.to_string(),
        })?;

        // The line is released when `request` drops.
        Ok(read == Value::Active)
    }

    #[cfg(not(all(target_os = "linux", feature = "hardware")))]
    fn write_and_read(&self, chip: &str, line: u32, _value: bool) -> Result<bool, HardwareError> {
        let _ = &self.consumer;
        Err(HardwareError::Unsupported(format!("{} line {}", chip, line)))
    }
}
