//! Group selection.

use super::TestConfig;
use crate::{BoardDocError, Result};

/// Restrict a description to one group, or keep everything when `requested` is `None`.
pub fn select(config: &TestConfig, requested: Option<&str>) -> Result<TestConfig> {
    let Some(name) = requested else {
        return Ok(config.clone());
    };

    match config.group(name) {
        Some(group) => Ok(TestConfig {
            groups: vec![group.clone()],
        }),
        None => Err(BoardDocError::UnknownGroup(name.to_string())),
    }
}

/// Group names in declaration order. Touches nothing but the parsed tree.
pub fn list_groups(config: &TestConfig) -> Vec<&str> {
    config.groups.iter().map(|g| g.name.as_str()).collect()
}
