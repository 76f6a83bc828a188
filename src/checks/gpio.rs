//! GPIO write/read-back check.

use super::{finish, param, str_param, u64_param, CheckResult};
use crate::config::Instance;
use crate::platform::gpio::DEFAULT_CHIP;
use crate::platform::GpioController;
use crate::registry::{unknown_operation, CheckProvider, ModuleDescriptor, Operation};
use crate::Outcome;
use std::sync::Arc;

pub const MODULE: &str = "gpio";
pub const TEST_READ_WRITE: &str = "test_read_write";

pub struct GpioProvider {
    descriptor: ModuleDescriptor,
    gpio: Arc<dyn GpioController>,
}

impl GpioProvider {
    pub fn new(gpio: Arc<dyn GpioController>) -> Self {
        GpioProvider {
            descriptor: ModuleDescriptor::builtin(
                MODULE,
                &["number", "value"],
                vec![Operation::new(
                    TEST_READ_WRITE,
                    "GPIO{number}: write the value '{value}' and read to confirm",
                )],
            ),
            gpio,
        }
    }

    fn read_write(&self, params: &Instance) -> CheckResult {
        let number = u64_param(params, "number")?;
        let line = u32::try_from(number).map_err(|_| format!("GPIO number {} out of range", number))?;
        let value = param(params, "value")?;
        let value = value
            .as_bool()
            .ok_or_else(|| format!("parameter 'value' must be 0, 1 or a boolean, got {}", value))?;
        let chip = if params.contains_key("chip") {
            str_param(params, "chip")?
        } else {
            DEFAULT_CHIP
        };

        let read = self
            .gpio
            .write_and_read(chip, line, value)
            .map_err(|e| e.to_string())?;

        if read == value {
            Ok(Outcome::passed(format!("GPIO{} reads back {}", line, u8::from(read))))
        } else {
            Ok(Outcome::failed(format!(
                "GPIO{}: wrote {}, read back {}",
                line,
                u8::from(value),
                u8::from(read)
            )))
        }
    }
}

impl CheckProvider for GpioProvider {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn run(&self, operation: &str, params: &Instance) -> Outcome {
        match operation {
            TEST_READ_WRITE => finish(self.read_write(params)),
            other => unknown_operation(MODULE, other),
        }
    }
}
