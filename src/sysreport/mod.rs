//! System report.
//!
//! Runs a list of diagnostic shell commands, condenses each output through
//! optional summary commands, and packs the raw outputs together with an
//! HTML overview into a zip archive. The command list is YAML:
//!
//! ```yaml
//! kernel:
//!   run: uname -a
//!   output: uname.txt
//!   summary:
//!     - title: Kernel release
//!       run: cut -d' ' -f3
//! usb:
//!   run: lsusb -v
//!   output: lsusb.txt
//!   on-fail:                 # tried when `run` exits non-zero
//!     run: lsusb
//!     output: lsusb.txt
//! i2c:
//!   run: i2cdetect -l
//!   output: i2c.txt
//!   superuser: preferred     # or `required`
//! ```
//!
//! Commands run under `sh` with stderr merged into stdout. A summary
//! command reads the raw output on stdin; when it fails its content is
//! [`EMPTY_SUMMARY`]. Without superuser rights a `required` command aborts
//! the report before anything runs and a `preferred` one is skipped.

mod html;

use crate::cli::output::JunitFormatter;
use crate::config::value::{yaml_key, yaml_type_name};
use crate::platform::host;
use crate::registry::external::write_payload;
use crate::{BoardDocError, Result};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive entry holding the HTML overview.
pub const SUMMARY_FILE: &str = "system_report_summary.html";

/// Archive entry holding the overview's stylesheet.
pub const STYLE_FILE: &str = "style.css";

/// Summary content when the summary command fails.
pub const EMPTY_SUMMARY: &str = "this summary is empty";

/// Privilege a command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Superuser {
    /// Abort the whole report when not running as root
    Required,
    /// Skip the command when not running as root
    Preferred,
}

/// A titled condensation of a command's output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryCommand {
    pub title: String,
    pub run: String,
}

/// One entry of the command list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ReportCommand {
    /// Key of the entry; a fallback shares its parent's name
    #[serde(skip)]
    pub name: String,
    pub run: String,
    /// Archive entry receiving the raw output
    pub output: String,
    #[serde(default)]
    pub summary: Vec<SummaryCommand>,
    pub on_fail: Option<Box<ReportCommand>>,
    pub superuser: Option<Superuser>,
}

impl ReportCommand {
    fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self.on_fail = self.on_fail.map(|fallback| Box::new(fallback.named(name)));
        self
    }

    /// The command followed by its fallbacks.
    pub fn chain(&self) -> impl Iterator<Item = &ReportCommand> {
        std::iter::successors(Some(self), |c| c.on_fail.as_deref())
    }
}

/// Read and parse a command list file.
pub fn load_commands(path: &Path) -> Result<Vec<ReportCommand>> {
    let text = fs::read_to_string(path).map_err(|e| BoardDocError::ConfigParse {
        context: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_commands(&text).map_err(|message| BoardDocError::ConfigParse {
        context: path.display().to_string(),
        message,
    })
}

/// Parse command list text; entries keep their declaration order.
pub fn parse_commands(text: &str) -> std::result::Result<Vec<ReportCommand>, String> {
    let root: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;

    let mapping = match &root {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Err("command list is empty".to_string()),
        other => {
            return Err(format!(
                "top level must map command names to commands, found {}",
                yaml_type_name(other)
            ))
        }
    };

    let reserved = [SUMMARY_FILE, STYLE_FILE];
    let mut commands: Vec<ReportCommand> = Vec::with_capacity(mapping.len());
    let mut taken: HashSet<String> = HashSet::new();

    for (key, body) in mapping {
        let name = yaml_key(key).ok_or("command names must be scalars")?;
        if commands.iter().any(|c| c.name == name) {
            return Err(format!("duplicate command '{}'", name));
        }
        let command = serde_yaml::from_value::<ReportCommand>(body.clone())
            .map_err(|e| format!("{}: {}", name, e))?
            .named(&name);

        // Fallbacks may reuse their own chain's file, never another command's.
        let outputs: HashSet<String> = command.chain().map(|c| c.output.clone()).collect();
        for output in &outputs {
            if output.is_empty() {
                return Err(format!("{}: output file name is empty", name));
            }
            if reserved.contains(&output.as_str()) {
                return Err(format!("{}: output file '{}' is reserved", name, output));
            }
            if taken.contains(output) {
                return Err(format!("{}: output file '{}' is already used", name, output));
            }
        }
        taken.extend(outputs);
        commands.push(command);
    }

    Ok(commands)
}

/// Titled summary text of one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub title: String,
    pub content: String,
}

/// Output of the command (or fallback) that succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub output_file: String,
    pub raw_output: String,
    pub summaries: Vec<Summary>,
}

/// Result of one command list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// None when every command in the chain failed or was skipped
    pub section: Option<Section>,
}

/// Collected results, in command list order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemReport {
    pub entries: Vec<Entry>,
}

impl SystemReport {
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.entries.iter().filter_map(|e| e.section.as_ref())
    }

    /// Archive entries in write order: raw outputs, overview, stylesheet.
    pub fn files(&self) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = self
            .sections()
            .map(|s| (s.output_file.clone(), s.raw_output.clone()))
            .collect();
        files.push((SUMMARY_FILE.to_string(), html::render(self)));
        files.push((STYLE_FILE.to_string(), html::STYLE.to_string()));
        files
    }

    /// Write every file into a deflated zip archive at `path`.
    pub fn write_archive(&self, path: &Path) -> Result<()> {
        let io_error = |source| BoardDocError::Io {
            context: format!("writing {}", path.display()),
            source,
        };

        let file = File::create(path).map_err(io_error)?;
        let mut archive = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, contents) in self.files() {
            archive.start_file(name, options)?;
            archive.write_all(contents.as_bytes()).map_err(io_error)?;
        }
        archive.finish()?;

        info!(path = %path.display(), "wrote system report");
        Ok(())
    }
}

impl fmt::Display for SystemReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let status = if entry.section.is_some() { "completed" } else { "failed" };
            writeln!(f, "{} {}", entry.name, status)?;
        }
        Ok(())
    }
}

/// Runs command lists with a fixed privilege level.
pub struct ReportRunner {
    superuser: bool,
}

impl ReportRunner {
    pub fn new(superuser: bool) -> Self {
        ReportRunner { superuser }
    }

    /// Runner for the current process's privileges.
    pub fn system() -> Self {
        ReportRunner::new(host::is_superuser())
    }

    /// Run every command in order.
    ///
    /// Fails before running anything when a `required` command cannot get
    /// superuser rights. A failing command only leaves its entry without a
    /// section.
    pub fn run(&self, commands: &[ReportCommand]) -> Result<SystemReport> {
        if !self.superuser {
            if let Some(denied) = commands
                .iter()
                .flat_map(|c| c.chain())
                .find(|c| c.superuser == Some(Superuser::Required))
            {
                return Err(BoardDocError::SystemReport(format!(
                    "insufficient permissions to run '{}', no system report generated",
                    denied.run
                )));
            }
        }

        let mut report = SystemReport::default();
        for command in commands {
            info!(command = %command.name, "running");
            let section = self.run_command(command);
            match &section {
                Some(_) => info!(command = %command.name, "completed"),
                None => warn!(command = %command.name, "failed"),
            }
            report.entries.push(Entry {
                name: command.name.clone(),
                section,
            });
        }
        Ok(report)
    }

    fn run_command(&self, command: &ReportCommand) -> Option<Section> {
        for candidate in command.chain() {
            if candidate.superuser == Some(Superuser::Preferred) && !self.superuser {
                warn!(
                    command = %candidate.name,
                    run = %candidate.run,
                    "insufficient permissions, output skipped"
                );
                continue;
            }

            match shell(&candidate.run, None) {
                Ok(raw_output) => {
                    let summaries = candidate
                        .summary
                        .iter()
                        .map(|s| summarize(s, &raw_output))
                        .collect();
                    return Some(Section {
                        name: candidate.name.clone(),
                        output_file: candidate.output.clone(),
                        raw_output,
                        summaries,
                    });
                }
                Err(reason) => debug!(command = %candidate.name, run = %candidate.run, %reason, "command failed"),
            }
        }
        None
    }
}

fn summarize(summary: &SummaryCommand, raw_output: &str) -> Summary {
    let content = shell(&summary.run, Some(raw_output)).unwrap_or_else(|reason| {
        debug!(title = %summary.title, %reason, "summary failed");
        EMPTY_SUMMARY.to_string()
    });
    Summary {
        title: summary.title.clone(),
        content,
    }
}

/// Run `script` under `sh` with stderr merged into stdout, feeding `input` on stdin.
fn shell(script: &str, input: Option<&str>) -> std::result::Result<String, String> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(format!("{{\n{}\n}} 2>&1", script))
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("cannot start sh: {}", e))?;

    let writer = input.map(|text| {
        let stdin = child.stdin.take();
        let text = text.to_string();
        thread::spawn(move || write_payload(stdin, &text))
    });

    let output = child.wait_with_output().map_err(|e| e.to_string())?;
    if let Some(writer) = writer {
        let _ = writer.join();
    }

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(output.status.to_string())
    }
}

/// Escape text for the HTML overview.
fn escape_html(s: &str) -> String {
    JunitFormatter::escape_xml(s)
}
