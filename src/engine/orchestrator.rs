//! Check execution orchestrator.
//!
//! Resolves every module entry of a description, binds its instances, and
//! runs the resulting units one at a time in declaration order: groups, then
//! modules within a group, then instances, then provider operations.
//!
//! # Graceful Degradation
//!
//! No single unit can stop the run:
//! - Unknown module or provider load failure: one errored "load" case per
//!   instance of that module entry, other modules continue
//! - Missing required parameter: one errored "bind" case for that instance,
//!   sibling instances continue
//! - Check panics: caught via std::panic::catch_unwind, recorded as errored
//! - Check timeout (when configured): recorded as errored, the run moves on;
//!   providers that start processes kill them first
//! - Empty description: returns an empty report (not an error)
//!
//! No function in this module will panic.

use crate::config::{ModuleEntry, TestConfig};
use crate::engine::binder::{bind, BoundCheck, UnitLocation};
use crate::engine::result::{CaseResult, Report, ResultAggregator};
use crate::platform::host;
use crate::registry::{CheckProvider, ModuleRegistry};
use crate::Outcome;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

/// Operation name recorded when a module cannot be resolved or loaded.
pub const LOAD_OPERATION: &str = "load";

/// Operation name recorded when an instance cannot be bound.
pub const BIND_OPERATION: &str = "bind";

/// Extra wait after a timeout for a provider to stop its own work.
const STOP_GRACE: Duration = Duration::from_millis(250);

/// Orchestrator configuration
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Per-unit time limit. `None` waits for every unit to finish.
    pub timeout: Option<Duration>,
}

/// One step of a run, decided before anything executes.
#[derive(Debug)]
pub enum PlanEntry {
    /// A bound unit ready to run
    Unit(BoundCheck),
    /// A module or instance that cannot run; becomes an errored case
    Error {
        location: UnitLocation,
        operation: String,
        cause: String,
    },
}

impl PlanEntry {
    pub fn location(&self) -> &UnitLocation {
        match self {
            PlanEntry::Unit(unit) => &unit.location,
            PlanEntry::Error { location, .. } => location,
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            PlanEntry::Unit(unit) => &unit.operation,
            PlanEntry::Error { operation, .. } => operation,
        }
    }
}

/// Check orchestrator
pub struct CheckOrchestrator {
    config: OrchestratorConfig,
    registry: ModuleRegistry,
}

impl CheckOrchestrator {
    /// Create a new orchestrator over a per-run registry
    pub fn new(config: OrchestratorConfig, registry: ModuleRegistry) -> Self {
        CheckOrchestrator { config, registry }
    }

    /// Resolve and bind every module entry without executing anything.
    ///
    /// External providers referenced by the description are loaded into the
    /// registry here, so every load happens before the first unit runs.
    pub fn plan(&mut self, config: &TestConfig) -> Vec<PlanEntry> {
        let mut plan = Vec::new();

        for group in &config.groups {
            for entry in &group.modules {
                match self.provider_for(entry) {
                    Ok(provider) => plan_instances(&group.name, entry, &provider, &mut plan),
                    Err(cause) => {
                        warn!(group = %group.name, module = %entry.name, "{}", cause);
                        // A module without instances still gets one case.
                        let count = entry.instances.len().max(1);
                        plan.extend((0..count).map(|i| PlanEntry::Error {
                            location: UnitLocation::new(&group.name, &entry.name, i),
                            operation: LOAD_OPERATION.to_string(),
                            cause: cause.clone(),
                        }));
                    }
                }
            }
        }

        debug!(entries = plan.len(), "plan ready");
        plan
    }

    /// Run every unit of `config` and build the report.
    pub fn run(&mut self, config: &TestConfig) -> Report {
        let start = Instant::now();
        let plan = self.plan(config);
        let mut aggregator = ResultAggregator::new();

        info!(units = plan.len(), "running checks");
        for entry in plan {
            aggregator.add_result(self.execute_entry(entry));
        }

        let total_duration_ms = start.elapsed().as_millis() as u64;
        let hostname = host::hostname().unwrap_or_else(|| "unknown".to_string());
        aggregator.set_metadata(hostname, total_duration_ms);

        let summary = aggregator.get_summary();
        info!(
            passed = summary.passed,
            failed = summary.failed,
            errored = summary.errored,
            duration_ms = total_duration_ms,
            "run complete"
        );
        aggregator.to_report()
    }

    fn provider_for(&mut self, entry: &ModuleEntry) -> Result<Arc<dyn CheckProvider>, String> {
        let resolved = match &entry.load_path {
            Some(path) => self.registry.load_external(&entry.name, path),
            None => self.registry.resolve(&entry.name),
        };
        resolved.map_err(|e| e.to_string())
    }

    fn execute_entry(&self, entry: PlanEntry) -> CaseResult {
        match entry {
            PlanEntry::Error {
                location,
                operation,
                cause,
            } => CaseResult {
                description: format!("{} module '{}'", operation, location.module),
                group: location.group,
                module: location.module,
                instance: location.instance,
                operation,
                outcome: Outcome::errored(cause),
                duration_ms: 0,
            },
            PlanEntry::Unit(unit) => {
                let location = unit.location.clone();
                let operation = unit.operation.clone();
                let description = unit.description.clone();

                let span = info_span!(
                    "check",
                    group = %location.group,
                    module = %location.module,
                    instance = location.instance,
                    operation = %operation
                );
                let _enter = span.enter();

                let start = Instant::now();
                let outcome = self.execute_unit(unit);
                let duration_ms = start.elapsed().as_millis() as u64;

                match &outcome {
                    Outcome::Passed { .. } => debug!(duration_ms, "passed"),
                    Outcome::Failed { reason } => info!(duration_ms, %reason, "failed"),
                    Outcome::Errored { cause } => warn!(duration_ms, %cause, "errored"),
                }

                CaseResult {
                    group: location.group,
                    module: location.module,
                    instance: location.instance,
                    operation,
                    description,
                    outcome,
                    duration_ms,
                }
            }
        }
    }

    /// Execute a single unit with panic and timeout handling
    fn execute_unit(&self, unit: BoundCheck) -> Outcome {
        let Some(limit) = self.config.timeout else {
            return run_guarded(move || unit.execute());
        };

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(format!("check-{}", unit.operation))
            .spawn(move || {
                // The receiver is gone after a timeout.
                let _ = tx.send(run_guarded(move || unit.execute_within(limit)));
            });
        if let Err(e) = spawned {
            return Outcome::errored(format!("cannot start check thread: {}", e));
        }

        match rx.recv_timeout(limit) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => match rx.recv_timeout(STOP_GRACE) {
                // The provider stopped its own work and said why.
                Ok(outcome @ Outcome::Errored { .. }) => outcome,
                _ => Outcome::errored(format!("timed out after {}s", limit.as_secs_f64())),
            },
            Err(RecvTimeoutError::Disconnected) => {
                Outcome::errored("check thread exited without a result")
            }
        }
    }
}

fn plan_instances(
    group: &str,
    entry: &ModuleEntry,
    provider: &Arc<dyn CheckProvider>,
    plan: &mut Vec<PlanEntry>,
) {
    for (i, instance) in entry.instances.iter().enumerate() {
        let location = UnitLocation::new(group, &entry.name, i);
        match bind(provider, instance, &location) {
            Ok(units) => plan.extend(units.into_iter().map(PlanEntry::Unit)),
            Err(e) => {
                warn!(%location, "{}", e);
                plan.push(PlanEntry::Error {
                    location,
                    operation: BIND_OPERATION.to_string(),
                    cause: e.to_string(),
                });
            }
        }
    }
}

fn run_guarded(check: impl FnOnce() -> Outcome) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(check)) {
        Ok(outcome) => outcome,
        Err(payload) => Outcome::errored(format!("check panicked: {}", panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}
