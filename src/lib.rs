//! board-doc library
//!
//! Declarative hardware check orchestration for embedded board bring-up.
//!
//! A YAML description lists groups of modules, each with an ordered list of
//! parameter sets ("instances"). Every module name resolves to a
//! [`CheckProvider`](registry::CheckProvider): built-in ones (I2C, GPIO,
//! camera) or external ones loaded from a provider directory. Each instance
//! is bound to every check operation its provider exposes, the resulting
//! units run one at a time, and the outcomes are folded into a
//! group → module → case [`Report`].
//!
//! # Example
//!
//! ```no_run
//! use board_doc::platform::Hardware;
//! use board_doc::{run_checks, RunConfig};
//!
//! let config = RunConfig::new("board.yml");
//! let report = run_checks(&config, Hardware::system()).expect("run failed");
//! println!("Checks passed: {}", report.summary().passed);
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod platform;
pub mod registry;
pub mod sysreport;
pub mod telemetry;
pub mod version;

use cli::args::Args;
use config::{selector, TestConfig};
use engine::orchestrator::{CheckOrchestrator, OrchestratorConfig, PlanEntry};
use platform::Hardware;
use registry::ModuleRegistry;
use serde::Serialize;
use sysreport::{ReportRunner, SystemReport};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Re-exports for public API
pub use engine::orchestrator::CheckOrchestrator as Orchestrator;
pub use engine::result::{Report, ResultSummary};

/// Outcome of one bound check unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The check ran and the hardware behaved as described
    Passed { message: String },
    /// The check ran and produced an unambiguous negative result
    Failed { reason: String },
    /// The check could not be evaluated
    Errored { cause: String },
}

impl Outcome {
    pub fn passed(message: impl Into<String>) -> Self {
        Outcome::Passed {
            message: message.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Outcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn errored(cause: impl Into<String>) -> Self {
        Outcome::Errored {
            cause: cause.into(),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed { .. })
    }

    /// Lowercase status label used by every output format.
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Passed { .. } => "passed",
            Outcome::Failed { .. } => "failed",
            Outcome::Errored { .. } => "errored",
        }
    }

    /// Diagnostic text carried by the outcome.
    pub fn message(&self) -> &str {
        match self {
            Outcome::Passed { message } => message,
            Outcome::Failed { reason } => reason,
            Outcome::Errored { cause } => cause,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed { message } => write!(f, "PASSED: {}", message),
            Outcome::Failed { reason } => write!(f, "FAILED: {}", reason),
            Outcome::Errored { cause } => write!(f, "ERRORED: {}", cause),
        }
    }
}

/// Error types for board-doc operations.
#[derive(Debug, thiserror::Error)]
pub enum BoardDocError {
    /// The configuration could not be read or does not have the expected shape
    #[error("Parse error in {context}: {message}")]
    ConfigParse { context: String, message: String },

    /// A requested group is absent from the configuration
    #[error("Unknown group: '{0}'")]
    UnknownGroup(String),

    /// No provider is registered under the module name
    #[error("Unknown module: '{0}'")]
    UnknownModule(String),

    /// A provider is already registered under the module name
    #[error("Module '{0}' is already registered")]
    DuplicateModule(String),

    /// An external provider is missing or does not have the required shape
    #[error("Failed to load provider '{module}' from {}: {reason}", path.display())]
    ProviderLoad {
        module: String,
        path: PathBuf,
        reason: String,
    },

    /// An instance lacks a parameter its provider requires
    #[error("Module '{module}' requires parameter '{parameter}'")]
    MissingParameter { module: String, parameter: String },

    /// The system report cannot be produced
    #[error("System report: {0}")]
    SystemReport(String),

    /// The system report archive could not be written
    #[error("Zip error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error
    #[error("I/O error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl BoardDocError {
    /// Whether the error aborts a run before any check executes.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BoardDocError::ConfigParse { .. } | BoardDocError::UnknownGroup(_) | BoardDocError::Io { .. }
        )
    }
}

/// Result type for board-doc operations
pub type Result<T> = std::result::Result<T, BoardDocError>;

/// Configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Path to the YAML test description
    pub config_path: PathBuf,
    /// Group to run (None = all)
    pub group: Option<String>,
    /// Per-unit timeout (None = wait indefinitely)
    pub timeout: Option<Duration>,
}

impl RunConfig {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        RunConfig {
            config_path: config_path.into(),
            group: None,
            timeout: None,
        }
    }

    /// Create configuration from command line arguments
    pub fn from_args(args: &Args) -> Self {
        RunConfig {
            config_path: args.config.clone(),
            group: args.group.clone(),
            timeout: args.timeout.map(Duration::from_secs),
        }
    }

    fn load(&self) -> Result<TestConfig> {
        let config = TestConfig::from_file(&self.config_path)?;
        selector::select(&config, self.group.as_deref())
    }

    fn orchestrator(&self, hardware: &Hardware) -> CheckOrchestrator {
        let orch_config = OrchestratorConfig {
            timeout: self.timeout,
        };
        CheckOrchestrator::new(orch_config, ModuleRegistry::with_builtins(hardware))
    }
}

/// Run every selected check.
///
/// Parse errors and unknown groups are returned before any hardware is
/// touched. Everything after that is recorded in the report: a module that
/// cannot be resolved or an instance that cannot be bound shows up as an
/// errored case, never as an `Err`.
///
/// # Example
///
/// ```no_run
/// use board_doc::platform::Hardware;
/// use board_doc::{run_checks, RunConfig};
///
/// let config = RunConfig {
///     group: Some("base".to_string()),
///     ..RunConfig::new("board.yml")
/// };
///
/// match run_checks(&config, Hardware::system()) {
///     Ok(report) => {
///         let summary = report.summary();
///         println!("Passed: {}, Failed: {}", summary.passed, summary.failed);
///     }
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_checks(config: &RunConfig, hardware: Hardware) -> Result<Report> {
    let selected = config.load()?;
    let mut orchestrator = config.orchestrator(&hardware);
    Ok(orchestrator.run(&selected))
}

/// Resolve and bind every selected check without executing any of them.
pub fn plan_checks(config: &RunConfig, hardware: Hardware) -> Result<Vec<PlanEntry>> {
    let selected = config.load()?;
    let mut orchestrator = config.orchestrator(&hardware);
    Ok(orchestrator.plan(&selected))
}

/// Group names in configuration order.
///
/// Only parses the file: no provider is loaded and nothing is executed.
pub fn list_groups(config_path: &Path) -> Result<Vec<String>> {
    let config = TestConfig::from_file(config_path)?;
    Ok(selector::list_groups(&config)
        .into_iter()
        .map(str::to_string)
        .collect())
}

/// Run the commands listed in `commands_path` and pack their output into
/// the zip archive at `archive_path`.
///
/// Commands that fail only leave a gap in the report; a malformed command
/// list or a missing superuser right for a `required` command returns an
/// error before anything runs.
pub fn generate_system_report(commands_path: &Path, archive_path: &Path) -> Result<SystemReport> {
    let commands = sysreport::load_commands(commands_path)?;
    let report = ReportRunner::system().run(&commands)?;
    report.write_archive(archive_path)?;
    Ok(report)
}

/// Process exit status for a finished run: 0 when every case passed.
pub fn exit_status(report: &Report) -> u8 {
    if report.summary().all_passed() {
        0
    } else {
        1
    }
}
