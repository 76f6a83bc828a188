//! Instance binding.
//!
//! Pairs one instance with a provider and produces a [`BoundCheck`] for every
//! check operation the provider exposes, in the provider's declared order.

use crate::config::Instance;
use crate::registry::CheckProvider;
use crate::{BoardDocError, Outcome, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Where a unit sits in the description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitLocation {
    pub group: String,
    pub module: String,
    /// Zero-based position of the instance within its module entry
    pub instance: usize,
}

impl UnitLocation {
    pub fn new(group: impl Into<String>, module: impl Into<String>, instance: usize) -> Self {
        UnitLocation {
            group: group.into(),
            module: module.into(),
            instance,
        }
    }
}

impl fmt::Display for UnitLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}[{}]", self.group, self.module, self.instance)
    }
}

/// One executable check: a provider operation bound to one instance.
pub struct BoundCheck {
    pub location: UnitLocation,
    pub operation: String,
    /// Operation description rendered against the instance
    pub description: String,
    pub params: Instance,
    provider: Arc<dyn CheckProvider>,
}

impl BoundCheck {
    /// Run the check. Consumes the unit; a unit runs at most once.
    pub fn execute(self) -> Outcome {
        self.provider.run(&self.operation, &self.params)
    }

    /// Run the check, letting the provider stop its own work after `timeout`.
    pub fn execute_within(self, timeout: Duration) -> Outcome {
        self.provider.run_with_timeout(&self.operation, &self.params, timeout)
    }
}

impl fmt::Debug for BoundCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundCheck")
            .field("location", &self.location)
            .field("operation", &self.operation)
            .field("description", &self.description)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Bind `instance` to every operation of `provider`.
///
/// Fails with `MissingParameter` naming the first required parameter (in the
/// provider's declared order) absent from the instance. Parameters the
/// provider does not declare are passed through untouched.
pub fn bind(
    provider: &Arc<dyn CheckProvider>,
    instance: &Instance,
    location: &UnitLocation,
) -> Result<Vec<BoundCheck>> {
    let descriptor = provider.descriptor();

    if let Some(missing) = descriptor
        .required
        .iter()
        .find(|param| !instance.contains_key(param))
    {
        return Err(BoardDocError::MissingParameter {
            module: descriptor.name.clone(),
            parameter: missing.clone(),
        });
    }

    Ok(descriptor
        .operations
        .iter()
        .map(|op| BoundCheck {
            location: location.clone(),
            operation: op.name.clone(),
            description: op.render(instance),
            params: instance.clone(),
            provider: Arc::clone(provider),
        })
        .collect())
}
