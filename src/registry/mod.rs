//! Module registry.
//!
//! Maps module names to check providers. A registry is an ordinary value
//! built once per run: built-ins are registered first, external providers
//! referenced by the description are loaded before execution starts, and the
//! registry is only read while checks run.
//!
//! Registration never replaces an existing entry. Redefining a built-in
//! module name is rejected with [`BoardDocError::DuplicateModule`].

pub mod external;

use crate::config::Instance;
use crate::platform::Hardware;
use crate::{BoardDocError, Outcome, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Prefix every check operation name must carry.
pub const CHECK_PREFIX: &str = "test_";

/// Where a provider came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleOrigin {
    BuiltIn,
    External { load_path: PathBuf },
}

/// One independently reported check a provider exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    /// Template rendered against instance parameters, `{param}` placeholders
    pub description: String,
}

impl Operation {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Operation {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Substitute `{param}` placeholders. Unknown placeholders are left as written.
    pub fn render(&self, params: &Instance) -> String {
        let template = self.description.as_str();
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let key = after[..close].trim();
                    match params.get(key) {
                        Some(value) => out.push_str(&value.to_string()),
                        None => out.push_str(&rest[open..open + close + 2]),
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Static shape of a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: String,
    pub origin: ModuleOrigin,
    /// Parameters every instance must carry
    pub required: Vec<String>,
    pub operations: Vec<Operation>,
}

impl ModuleDescriptor {
    pub fn builtin(name: &str, required: &[&str], operations: Vec<Operation>) -> Self {
        ModuleDescriptor {
            name: name.to_string(),
            origin: ModuleOrigin::BuiltIn,
            required: required.iter().map(|r| r.to_string()).collect(),
            operations,
        }
    }

    /// Check the provider shape: a name, at least one operation, and unique
    /// operation names carrying [`CHECK_PREFIX`].
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("module name is empty".to_string());
        }
        if self.operations.is_empty() {
            return Err("provider exposes no check operations".to_string());
        }
        for (i, op) in self.operations.iter().enumerate() {
            if !op.name.starts_with(CHECK_PREFIX) || op.name.len() == CHECK_PREFIX.len() {
                return Err(format!(
                    "operation '{}' is not a check (names must start with '{}')",
                    op.name, CHECK_PREFIX
                ));
            }
            if self.operations[..i].iter().any(|o| o.name == op.name) {
                return Err(format!("operation '{}' is declared twice", op.name));
            }
        }
        Ok(())
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|o| o.name == name)
    }
}

/// A check provider: declared name, required parameters, and check operations.
///
/// Built-in and external providers implement the same trait; only their
/// discovery differs.
pub trait CheckProvider: Send + Sync {
    fn descriptor(&self) -> &ModuleDescriptor;

    /// Run one operation against an instance's parameters.
    ///
    /// Must not panic for bad parameter types; report them as `Errored`.
    fn run(&self, operation: &str, params: &Instance) -> Outcome;

    /// Run one operation under a time limit.
    ///
    /// The orchestrator reports the case as timed out either way; providers
    /// that start processes override this to stop them once `timeout` passes.
    fn run_with_timeout(&self, operation: &str, params: &Instance, _timeout: Duration) -> Outcome {
        self.run(operation, params)
    }
}

/// Outcome for an operation name a provider does not implement.
pub fn unknown_operation(module: &str, operation: &str) -> Outcome {
    Outcome::errored(format!("module '{}' has no operation '{}'", module, operation))
}

/// Per-run catalog of providers.
#[derive(Default)]
pub struct ModuleRegistry {
    providers: Vec<Arc<dyn CheckProvider>>,
}

impl ModuleRegistry {
    /// Empty registry
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    /// Registry holding the built-in I2C, GPIO and camera providers.
    pub fn with_builtins(hardware: &Hardware) -> Self {
        let mut registry = ModuleRegistry::new();
        for provider in crate::checks::builtin_providers(hardware) {
            // Built-in names are distinct constants.
            if let Err(e) = registry.register(provider) {
                tracing::error!("built-in registration failed: {}", e);
            }
        }
        registry
    }

    /// Add a provider under its declared name.
    pub fn register(&mut self, provider: Arc<dyn CheckProvider>) -> Result<()> {
        let name = provider.descriptor().name.clone();
        if self.contains(&name) {
            return Err(BoardDocError::DuplicateModule(name));
        }
        debug!(module = %name, origin = ?provider.descriptor().origin, "registered module");
        self.providers.push(provider);
        Ok(())
    }

    /// Look up a provider by module name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn CheckProvider>> {
        self.find(name)
            .cloned()
            .ok_or_else(|| BoardDocError::UnknownModule(name.to_string()))
    }

    /// Load and register the external provider at `load_path` under `name`.
    ///
    /// Loading the same name from the same directory again returns the first
    /// registration. Any other clash with a registered name is
    /// `DuplicateModule`, checked before the directory is read.
    pub fn load_external(&mut self, name: &str, load_path: &Path) -> Result<Arc<dyn CheckProvider>> {
        let wanted = canonical(load_path);

        if let Some(existing) = self.find(name) {
            return match &existing.descriptor().origin {
                ModuleOrigin::External { load_path } if canonical(load_path) == wanted => {
                    Ok(existing.clone())
                }
                _ => Err(BoardDocError::DuplicateModule(name.to_string())),
            };
        }

        let provider: Arc<dyn CheckProvider> = Arc::new(external::load(name, load_path)?);
        info!(module = %name, path = %load_path.display(), "loaded external provider");
        self.register(provider.clone())?;
        Ok(provider)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Registered module names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.providers
            .iter()
            .map(|p| p.descriptor().name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn CheckProvider>> {
        self.providers.iter().find(|p| p.descriptor().name == name)
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
