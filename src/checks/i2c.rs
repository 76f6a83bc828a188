//! I2C bus presence check.

use super::{finish, param, u64_param, CheckResult};
use crate::config::Instance;
use crate::platform::I2cBus;
use crate::registry::{unknown_operation, CheckProvider, ModuleDescriptor, Operation};
use crate::Outcome;
use std::sync::Arc;

pub const MODULE: &str = "i2c";
pub const TEST_BUS_DETECT: &str = "test_bus_detect";

/// Highest 7-bit address.
const MAX_ADDRESS: u64 = 0x7f;

pub struct I2cProvider {
    descriptor: ModuleDescriptor,
    bus: Arc<dyn I2cBus>,
}

impl I2cProvider {
    pub fn new(bus: Arc<dyn I2cBus>) -> Self {
        I2cProvider {
            descriptor: ModuleDescriptor::builtin(
                MODULE,
                &["bus", "addresses"],
                vec![Operation::new(
                    TEST_BUS_DETECT,
                    "I2C bus {bus}: devices respond at addresses {addresses}",
                )],
            ),
            bus,
        }
    }

    fn bus_detect(&self, params: &Instance) -> CheckResult {
        let bus = u64_param(params, "bus")?;
        let bus = u32::try_from(bus).map_err(|_| format!("bus number {} out of range", bus))?;
        let addresses = addresses(params)?;

        let mut missing = Vec::new();
        for &address in &addresses {
            let present = self.bus.detect(bus, address).map_err(|e| e.to_string())?;
            if !present {
                missing.push(address);
            }
        }

        if missing.is_empty() {
            Ok(Outcome::passed(format!(
                "detected {} on bus {}",
                format_addresses(&addresses),
                bus
            )))
        } else {
            Ok(Outcome::failed(format!(
                "not detected on bus {}: {}",
                bus,
                format_addresses(&missing)
            )))
        }
    }
}

impl CheckProvider for I2cProvider {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn run(&self, operation: &str, params: &Instance) -> Outcome {
        match operation {
            TEST_BUS_DETECT => finish(self.bus_detect(params)),
            other => unknown_operation(MODULE, other),
        }
    }
}

/// `addresses` may be a single address or a list.
fn addresses(params: &Instance) -> Result<Vec<u16>, String> {
    let value = param(params, "addresses")?;
    let items = match value.as_list() {
        Some(items) => items.to_vec(),
        None => vec![value.clone()],
    };
    if items.is_empty() {
        return Err("parameter 'addresses' is empty".to_string());
    }

    items
        .iter()
        .map(|item| match item.as_u64() {
            Some(a) if a <= MAX_ADDRESS => Ok(a as u16),
            Some(a) => Err(format!("address {:#04x} is not a 7-bit address", a)),
            None => Err(format!("address {} is not an integer", item)),
        })
        .collect()
}

fn format_addresses(addresses: &[u16]) -> String {
    addresses
        .iter()
        .map(|a| format!("{:#04x}", a))
        .collect::<Vec<_>>()
        .join(", ")
}
