//! Result aggregation and reporting.
//!
//! Collects case results in execution order and folds them into a
//! group → module → case tree with pass/fail/error roll-ups at every level.

use crate::Outcome;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of one executed (or unexecutable) unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub group: String,
    pub module: String,
    pub instance: usize,
    pub operation: String,
    pub description: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration_ms: u64,
}

impl CaseResult {
    /// Stable case name: operation plus instance index.
    pub fn name(&self) -> String {
        format!("{}[{}]", self.operation, self.instance)
    }
}

/// Result summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub passed: u32,
    pub failed: u32,
    pub errored: u32,
    pub total: u32,
    pub duration_ms: u64,
}

impl ResultSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    fn add(&mut self, case: &CaseResult) {
        self.total += 1;
        self.duration_ms += case.duration_ms;
        match case.outcome {
            Outcome::Passed { .. } => self.passed += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Errored { .. } => self.errored += 1,
        }
    }

    fn merge(&mut self, other: ResultSummary) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.errored += other.errored;
        self.total += other.total;
        self.duration_ms += other.duration_ms;
    }

    fn of<'a>(cases: impl IntoIterator<Item = &'a CaseResult>) -> Self {
        let mut summary = ResultSummary::default();
        for case in cases {
            summary.add(case);
        }
        summary
    }
}

/// Cases of one module entry within a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleReport {
    pub name: String,
    pub cases: Vec<CaseResult>,
}

impl ModuleReport {
    pub fn summary(&self) -> ResultSummary {
        ResultSummary::of(&self.cases)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub modules: Vec<ModuleReport>,
}

impl GroupReport {
    pub fn summary(&self) -> ResultSummary {
        let mut summary = ResultSummary::default();
        for module in &self.modules {
            summary.merge(module.summary());
        }
        summary
    }
}

/// Run report containing every case result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub total_duration_ms: u64,
    pub groups: Vec<GroupReport>,
}

impl Report {
    /// Roll-up over every case in the run.
    pub fn summary(&self) -> ResultSummary {
        let mut summary = ResultSummary::default();
        for group in &self.groups {
            summary.merge(group.summary());
        }
        summary
    }

    /// Every case in execution order.
    pub fn cases(&self) -> impl Iterator<Item = &CaseResult> {
        self.groups
            .iter()
            .flat_map(|g| g.modules.iter())
            .flat_map(|m| m.cases.iter())
    }
}

/// Fold ordered case results into the group → module → case tree.
///
/// Groups and modules appear in order of first occurrence; cases keep
/// their input order.
pub fn aggregate(cases: &[CaseResult]) -> Vec<GroupReport> {
    let mut groups: Vec<GroupReport> = Vec::new();

    for case in cases {
        let group = match groups.iter().position(|g| g.name == case.group) {
            Some(i) => &mut groups[i],
            None => {
                groups.push(GroupReport {
                    name: case.group.clone(),
                    modules: Vec::new(),
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };

        match group.modules.iter_mut().find(|m| m.name == case.module) {
            Some(module) => module.cases.push(case.clone()),
            None => group.modules.push(ModuleReport {
                name: case.module.clone(),
                cases: vec![case.clone()],
            }),
        }
    }

    groups
}

/// Result aggregator for collecting case results
#[derive(Debug, Default)]
pub struct ResultAggregator {
    cases: Vec<CaseResult>,
    hostname: String,
    total_duration_ms: u64,
}

impl ResultAggregator {
    /// Create a new result aggregator
    pub fn new() -> Self {
        ResultAggregator::default()
    }

    /// Set report metadata
    pub fn set_metadata(&mut self, hostname: String, total_duration_ms: u64) {
        self.hostname = hostname;
        self.total_duration_ms = total_duration_ms;
    }

    /// Add a completed case result
    pub fn add_result(&mut self, case: CaseResult) {
        self.cases.push(case);
    }

    /// Get summary statistics
    pub fn get_summary(&self) -> ResultSummary {
        ResultSummary::of(&self.cases)
    }

    /// Create final report
    pub fn to_report(&self) -> Report {
        Report {
            timestamp: Utc::now(),
            hostname: self.hostname.clone(),
            total_duration_ms: self.total_duration_ms,
            groups: aggregate(&self.cases),
        }
    }
}
