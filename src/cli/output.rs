//! Output formatting for board-doc.
//!
//! Provides terminal, JSON, JUnit XML and CSV report formatters, plus the
//! Markdown check documentation written by `--generate-docs`.
//!
//! # Graceful Degradation
//!
//! - Non-TTY output: color disabled via NO_COLOR or --no-color
//! - Empty reports: valid output with zero cases
//! - Diagnostics containing markup or separators: escaped for each format
//!
//! All formatters produce valid output for any Report input.
//! No function in this module will panic.

use crate::cli::args::OutputFormat;
use crate::engine::orchestrator::PlanEntry;
use crate::engine::result::{CaseResult, ModuleReport, Report, ResultSummary};
use crate::Outcome;
use serde::Serialize;

const RULE: &str = "--------------------------------------------------------------------------------";

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a report into a string
    fn format(&self, report: &Report) -> String;
}

/// Terminal (human-readable) formatter
pub struct TerminalFormatter {
    color: bool,
    verbose: bool,
    quiet: bool,
}

impl TerminalFormatter {
    pub fn new(color: bool, verbose: bool, quiet: bool) -> Self {
        TerminalFormatter {
            color,
            verbose,
            quiet,
        }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    fn status_label(&self, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Passed { .. } => self.colorize("[PASS]", "32"),
            Outcome::Failed { .. } => self.colorize("[FAIL]", "31"),
            Outcome::Errored { .. } => self.colorize("[ERR ]", "33"),
        }
    }

    fn format_case(&self, case: &CaseResult) -> String {
        let mut line = format!(
            "    {} {}: {}",
            self.status_label(&case.outcome),
            case.name(),
            case.description
        );
        if !case.outcome.is_passed() || self.verbose {
            line.push_str(&format!("\n           {}", case.outcome.message()));
        }
        if self.verbose {
            line.push_str(&format!(" ({}ms)", case.duration_ms));
        }
        line.push('\n');
        line
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, report: &Report) -> String {
        let mut output = String::new();

        output.push_str(RULE);
        output.push('\n');
        output.push_str("board-doc check report\n");
        output.push_str(&format!("Host: {}\n", report.hostname));
        output.push_str(&format!(
            "Timestamp: {}\n",
            report.timestamp.format("%Y-%m-%dT%H:%M:%SZ")
        ));
        output.push_str(RULE);
        output.push_str("\n\n");

        for group in &report.groups {
            let group_summary = group.summary();
            if self.quiet && group_summary.all_passed() {
                continue;
            }

            output.push_str(&format!(
                "{} ({}/{} passed)\n",
                group.name.to_uppercase(),
                group_summary.passed,
                group_summary.total
            ));

            for module in &group.modules {
                if self.quiet && module.summary().all_passed() {
                    continue;
                }
                output.push_str(&format!("  {}\n", module.name));

                for case in &module.cases {
                    if self.quiet && case.outcome.is_passed() {
                        continue;
                    }
                    output.push_str(&self.format_case(case));
                }
            }

            output.push('\n');
        }

        let summary = report.summary();
        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!(
            "SUMMARY: {} passed, {} failed, {} errored\n",
            summary.passed, summary.failed, summary.errored
        ));
        output.push_str(&format!(
            "Total time: {:.1}s\n",
            report.total_duration_ms as f64 / 1000.0
        ));
        let exit_desc = if summary.all_passed() {
            "all checks passed"
        } else {
            "failures detected"
        };
        output.push_str(&format!(
            "Exit code: {} ({})\n",
            crate::exit_status(report),
            exit_desc
        ));
        output.push_str(RULE);

        output
    }
}

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

/// Report plus its top-level roll-up, as written to JSON.
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a Report,
    summary: ResultSummary,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &Report) -> String {
        let document = JsonReport {
            report,
            summary: report.summary(),
        };
        let encoded = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        // Every field is a plain string, number or map with string keys.
        encoded.unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

/// JUnit XML formatter: one testsuite per module entry, one testcase per
/// (instance, operation) pair.
#[derive(Default)]
pub struct JunitFormatter;

impl JunitFormatter {
    pub fn new() -> Self {
        JunitFormatter
    }

    /// Escape text for XML and HTML markup.
    pub(crate) fn escape_xml(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => result.push_str("&amp;"),
                '<' => result.push_str("&lt;"),
                '>' => result.push_str("&gt;"),
                '"' => result.push_str("&quot;"),
                '\'' => result.push_str("&apos;"),
                // Not representable in XML 1.0
                c if c.is_control() && !matches!(c, '\n' | '\r' | '\t') => {}
                c => result.push(c),
            }
        }
        result
    }

    fn format_suite(&self, output: &mut String, group: &str, module: &ModuleReport) {
        let summary = module.summary();
        output.push_str(&format!(
            "  <testsuite name=\"{}\" package=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"0\" time=\"{:.3}\">\n",
            Self::escape_xml(&module.name),
            Self::escape_xml(group),
            summary.total,
            summary.failed,
            summary.errored,
            summary.duration_ms as f64 / 1000.0
        ));

        for case in &module.cases {
            output.push_str(&format!(
                "    <testcase name=\"{}\" classname=\"{}.{}\" time=\"{:.3}\">\n",
                Self::escape_xml(&case.name()),
                Self::escape_xml(group),
                Self::escape_xml(&module.name),
                case.duration_ms as f64 / 1000.0
            ));

            match &case.outcome {
                Outcome::Passed { message } => {
                    output.push_str(&format!(
                        "      <system-out>{}: {}</system-out>\n",
                        Self::escape_xml(&case.description),
                        Self::escape_xml(message)
                    ));
                }
                Outcome::Failed { reason } => {
                    output.push_str(&format!(
                        "      <failure message=\"{}\">{}</failure>\n",
                        Self::escape_xml(reason),
                        Self::escape_xml(&case.description)
                    ));
                }
                Outcome::Errored { cause } => {
                    output.push_str(&format!(
                        "      <error message=\"{}\">{}</error>\n",
                        Self::escape_xml(cause),
                        Self::escape_xml(&case.description)
                    ));
                }
            }

            output.push_str("    </testcase>\n");
        }

        output.push_str("  </testsuite>\n");
    }
}

impl OutputFormatter for JunitFormatter {
    fn format(&self, report: &Report) -> String {
        let mut output = String::new();
        output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        let summary = report.summary();
        output.push_str(&format!(
            "<testsuites name=\"board-doc\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"0\" time=\"{:.3}\" timestamp=\"{}\">\n",
            summary.total,
            summary.failed,
            summary.errored,
            report.total_duration_ms as f64 / 1000.0,
            report.timestamp.format("%Y-%m-%dT%H:%M:%S")
        ));

        for group in &report.groups {
            for module in &group.modules {
                self.format_suite(&mut output, &group.name, module);
            }
        }

        output.push_str("</testsuites>\n");
        output
    }
}

/// CSV formatter: one row per case.
#[derive(Default)]
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn new() -> Self {
        CsvFormatter
    }

    fn escape_csv(field: &str) -> String {
        if field.contains([',', '"', '\n', '\r']) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }
}

impl OutputFormatter for CsvFormatter {
    fn format(&self, report: &Report) -> String {
        let mut output =
            String::from("group,module,instance,operation,status,duration_ms,description,message\n");
        for case in report.cases() {
            let row = [
                Self::escape_csv(&case.group),
                Self::escape_csv(&case.module),
                case.instance.to_string(),
                Self::escape_csv(&case.operation),
                case.outcome.status().to_string(),
                case.duration_ms.to_string(),
                Self::escape_csv(&case.description),
                Self::escape_csv(case.outcome.message()),
            ];
            output.push_str(&row.join(","));
            output.push('\n');
        }
        output
    }
}

/// Get a formatter based on the output format
pub fn get_formatter(
    format: OutputFormat,
    no_color: bool,
    verbose: bool,
    quiet: bool,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TerminalFormatter::new(!no_color, verbose, quiet)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Junit => Box::new(JunitFormatter::new()),
    }
}

/// Markdown documentation of a plan: one section per group, one table per
/// module listing every bound check and its rendered description.
pub fn render_docs(plan: &[PlanEntry]) -> String {
    let mut output = String::from("# Board checks\n");
    let mut current: Option<(&str, &str)> = None;

    for entry in plan {
        let location = entry.location();
        let group = location.group.as_str();
        let module = location.module.as_str();

        if current.map(|(g, _)| g) != Some(group) {
            output.push_str(&format!("\n## {}\n", group));
        }
        if current != Some((group, module)) {
            output.push_str(&format!(
                "\n### {}\n\n| Instance | Check | Description |\n|---|---|---|\n",
                module
            ));
        }
        current = Some((group, module));

        let (operation, description) = match entry {
            PlanEntry::Unit(unit) => (unit.operation.as_str(), unit.description.clone()),
            PlanEntry::Error {
                operation, cause, ..
            } => (operation.as_str(), format!("**cannot run:** {}", cause)),
        };
        output.push_str(&format!(
            "| {} | `{}` | {} |\n",
            location.instance,
            operation,
            description.replace('|', "\\|").replace('\n', " ")
        ));
    }

    output
}
