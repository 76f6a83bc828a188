//! Built-in check providers.
//!
//! - I2C: devices acknowledge at the listed bus addresses
//! - GPIO: a line can be driven and read back
//! - Camera: a video device exists and reports the expected name and driver
//!
//! # Graceful Degradation
//!
//! Providers never panic on bad input:
//! - Parameter of the wrong type: `Errored`, naming the parameter
//! - Bus, chip or device unavailable: `Errored`
//! - Hardware answered but not as described: `Failed`

pub mod camera;
pub mod gpio;
pub mod i2c;

use crate::config::{Instance, ParamValue};
use crate::platform::Hardware;
use crate::registry::CheckProvider;
use crate::Outcome;
use std::sync::Arc;

/// All built-in providers, wired to `hardware`.
pub fn builtin_providers(hardware: &Hardware) -> Vec<Arc<dyn CheckProvider>> {
    vec![
        Arc::new(i2c::I2cProvider::new(hardware.i2c.clone())),
        Arc::new(gpio::GpioProvider::new(hardware.gpio.clone())),
        Arc::new(camera::CameraProvider::new(hardware.video.clone())),
    ]
}

/// Check body result; `Err` carries the cause of an `Errored` outcome.
pub(crate) type CheckResult = Result<Outcome, String>;

pub(crate) fn finish(result: CheckResult) -> Outcome {
    result.unwrap_or_else(Outcome::errored)
}

pub(crate) fn param<'a>(params: &'a Instance, name: &str) -> Result<&'a ParamValue, String> {
    params
        .get(name)
        .ok_or_else(|| format!("missing parameter '{}'", name))
}

pub(crate) fn u64_param(params: &Instance, name: &str) -> Result<u64, String> {
    let value = param(params, name)?;
    value
        .as_u64()
        .ok_or_else(|| format!("parameter '{}' must be a non-negative integer, got {}", name, value.type_name()))
}

pub(crate) fn str_param<'a>(params: &'a Instance, name: &str) -> Result<&'a str, String> {
    let value = param(params, name)?;
    value
        .as_str()
        .ok_or_else(|| format!("parameter '{}' must be a string, got {}", name, value.type_name()))
}
