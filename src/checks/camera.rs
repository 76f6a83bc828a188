//! Camera device checks.

use super::{finish, str_param, CheckResult};
use crate::config::Instance;
use crate::platform::VideoDevices;
use crate::registry::{unknown_operation, CheckProvider, ModuleDescriptor, Operation};
use crate::Outcome;
use std::sync::Arc;

pub const MODULE: &str = "camera";
pub const TEST_DEVICE_EXISTS: &str = "test_device_exists";
pub const TEST_CAMERA_NAME: &str = "test_camera_name";
pub const TEST_DRIVER_NAME: &str = "test_driver_name";

pub struct CameraProvider {
    descriptor: ModuleDescriptor,
    video: Arc<dyn VideoDevices>,
}

impl CameraProvider {
    pub fn new(video: Arc<dyn VideoDevices>) -> Self {
        CameraProvider {
            descriptor: ModuleDescriptor::builtin(
                MODULE,
                &["device", "camera_name", "driver_name"],
                vec![
                    Operation::new(TEST_DEVICE_EXISTS, "{device}: device node exists"),
                    Operation::new(TEST_CAMERA_NAME, "{device}: camera reports the name '{camera_name}'"),
                    Operation::new(TEST_DRIVER_NAME, "{device}: bound to the '{driver_name}' driver"),
                ],
            ),
            video,
        }
    }

    fn device_exists(&self, params: &Instance) -> CheckResult {
        let device = str_param(params, "device")?;
        if self.video.exists(device) {
            Ok(Outcome::passed(format!("{} exists", device)))
        } else {
            Ok(Outcome::failed(format!("{} does not exist", device)))
        }
    }

    fn camera_name(&self, params: &Instance) -> CheckResult {
        let device = str_param(params, "device")?;
        let expected = str_param(params, "camera_name")?;
        let actual = self.video.name(device).map_err(|e| e.to_string())?;
        Ok(compare("name", device, expected, &actual))
    }

    fn driver_name(&self, params: &Instance) -> CheckResult {
        let device = str_param(params, "device")?;
        let expected = str_param(params, "driver_name")?;
        let actual = self.video.driver(device).map_err(|e| e.to_string())?;
        Ok(compare("driver", device, expected, &actual))
    }
}

fn compare(what: &str, device: &str, expected: &str, actual: &str) -> Outcome {
    if actual == expected {
        Outcome::passed(format!("{} {} is '{}'", device, what, actual))
    } else {
        Outcome::failed(format!(
            "{} {} is '{}', expected '{}'",
            device, what, actual, expected
        ))
    }
}

impl CheckProvider for CameraProvider {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn run(&self, operation: &str, params: &Instance) -> Outcome {
        match operation {
            TEST_DEVICE_EXISTS => finish(self.device_exists(params)),
            TEST_CAMERA_NAME => finish(self.camera_name(params)),
            TEST_DRIVER_NAME => finish(self.driver_name(params)),
            other => unknown_operation(MODULE, other),
        }
    }
}
