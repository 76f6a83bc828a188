//! Test description model.
//!
//! The description file is YAML:
//!
//! ```yaml
//! base:                      # group
//!   i2c:                     # built-in module
//!     - bus: 1               # instance
//!       addresses: [0x3c]
//! additional:
//!   sensor:                  # external module
//!     path: providers/sensor
//!     tests:
//!       - channel: 2
//! ```
//!
//! Groups, modules and instances keep their declaration order; that order is
//! the execution and report order.

pub mod selector;
pub mod value;

pub use value::{ParamMap, ParamValue};

use crate::{BoardDocError, Result};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use value::{yaml_key, yaml_type_name};

/// One concrete parameter set of a module.
pub type Instance = ParamMap;

/// Key holding an external provider's directory in a module entry.
pub const LOAD_PATH_KEY: &str = "path";

/// Key holding the instance list when a module entry is a mapping.
pub const INSTANCES_KEY: &str = "tests";

/// A module reference inside a group.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleEntry {
    pub name: String,
    /// Directory of an externally supplied provider
    pub load_path: Option<PathBuf>,
    pub instances: Vec<Instance>,
}

impl ModuleEntry {
    pub fn builtin(name: impl Into<String>, instances: Vec<Instance>) -> Self {
        ModuleEntry {
            name: name.into(),
            load_path: None,
            instances,
        }
    }
}

/// A named partition of the description.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub modules: Vec<ModuleEntry>,
}

impl Group {
    pub fn instance_count(&self) -> usize {
        self.modules.iter().map(|m| m.instances.len()).sum()
    }
}

/// Parsed test description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestConfig {
    pub groups: Vec<Group>,
}

impl TestConfig {
    /// Read and parse a description file.
    ///
    /// Relative provider paths are resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| BoardDocError::ConfigParse {
            context: path.display().to_string(),
            message: e.to_string(),
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&text, base_dir).map_err(|message| BoardDocError::ConfigParse {
            context: path.display().to_string(),
            message,
        })
    }

    /// Parse description text; relative provider paths are joined onto `base_dir`.
    pub fn from_yaml_str(text: &str, base_dir: &Path) -> Result<Self> {
        Self::parse(text, base_dir).map_err(|message| BoardDocError::ConfigParse {
            context: "<inline>".to_string(),
            message,
        })
    }

    fn parse(text: &str, base_dir: &Path) -> std::result::Result<Self, String> {
        let root: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;

        let mapping = match &root {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Err("configuration is empty".to_string()),
            other => {
                return Err(format!(
                    "top level must map group names to modules, found {}",
                    yaml_type_name(other)
                ))
            }
        };

        let mut groups = Vec::with_capacity(mapping.len());
        for (key, body) in mapping {
            let name = yaml_key(key).ok_or("group names must be scalars")?;
            if groups.iter().any(|g: &Group| g.name == name) {
                return Err(format!("duplicate group '{}'", name));
            }
            let modules = parse_group(&name, body, base_dir)?;
            groups.push(Group { name, modules });
        }

        Ok(TestConfig { groups })
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Total number of instances across every group.
    pub fn instance_count(&self) -> usize {
        self.groups.iter().map(Group::instance_count).sum()
    }
}

fn parse_group(group: &str, body: &Value, base_dir: &Path) -> std::result::Result<Vec<ModuleEntry>, String> {
    let mapping = match body {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(format!(
                "group '{}' must map module names to tests, found {}",
                group,
                yaml_type_name(other)
            ))
        }
    };

    let mut modules = Vec::with_capacity(mapping.len());
    for (key, entry) in mapping {
        let name = yaml_key(key).ok_or_else(|| format!("group '{}': module names must be scalars", group))?;
        if modules.iter().any(|m: &ModuleEntry| m.name == name) {
            return Err(format!("group '{}': duplicate module '{}'", group, name));
        }
        let context = format!("{}.{}", group, name);
        let module = match entry {
            Value::Null => ModuleEntry::builtin(name, Vec::new()),
            Value::Sequence(_) => ModuleEntry::builtin(name, parse_instances(entry, &context)?),
            Value::Mapping(fields) => {
                let mut load_path = None;
                let mut instances = Vec::new();
                for (field, value) in fields {
                    match field.as_str() {
                        Some(LOAD_PATH_KEY) => {
                            let raw = value
                                .as_str()
                                .ok_or_else(|| format!("{}: '{}' must be a string", context, LOAD_PATH_KEY))?;
                            load_path = Some(base_dir.join(raw));
                        }
                        Some(INSTANCES_KEY) => instances = parse_instances(value, &context)?,
                        _ => {
                            return Err(format!(
                                "{}: unexpected key {:?} (expected '{}' and '{}')",
                                context,
                                yaml_key(field).unwrap_or_default(),
                                LOAD_PATH_KEY,
                                INSTANCES_KEY
                            ))
                        }
                    }
                }
                ModuleEntry {
                    name,
                    load_path,
                    instances,
                }
            }
            other => {
                return Err(format!(
                    "{}: expected a list of tests, found {}",
                    context,
                    yaml_type_name(other)
                ))
            }
        };
        modules.push(module);
    }

    Ok(modules)
}

fn parse_instances(value: &Value, context: &str) -> std::result::Result<Vec<Instance>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| ParamMap::from_yaml(item, &format!("{}[{}]", context, i)))
            .collect(),
        other => Err(format!(
            "{}: expected a list of tests, found {}",
            context,
            yaml_type_name(other)
        )),
    }
}
