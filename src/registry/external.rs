//! External providers.
//!
//! An external provider is a directory holding a `provider.yaml` manifest:
//!
//! ```yaml
//! name: sensor
//! required: [channel]
//! checks:
//!   - name: test_reading
//!     description: "Sensor channel {channel} returns a reading"
//!     run: ["./check_reading.sh", "--strict"]
//! ```
//!
//! Each check runs as a child process in the provider directory. The bound
//! parameters arrive as a JSON object on stdin and in `BOARD_DOC_PARAMS`;
//! `BOARD_DOC_CHECK` names the check. Exit status 0 passes, 1 fails, and
//! anything else (another code, a signal, a spawn failure) is an error.

use super::{unknown_operation, CheckProvider, ModuleDescriptor, ModuleOrigin, Operation};
use crate::config::Instance;
use crate::{BoardDocError, Outcome, Result};
use serde::Deserialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// Manifest file name inside a provider directory.
pub const MANIFEST_FILE: &str = "provider.yaml";

/// Environment variable carrying the JSON-encoded parameters.
pub const PARAMS_ENV: &str = "BOARD_DOC_PARAMS";

/// Environment variable carrying the check operation name.
pub const CHECK_ENV: &str = "BOARD_DOC_CHECK";

/// Exit status meaning "ran and did not pass".
const EXIT_FAILED: i32 = 1;

/// How often a time-limited check process is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    name: String,
    #[serde(default)]
    required: Vec<String>,
    checks: Vec<ManifestCheck>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestCheck {
    name: String,
    #[serde(default)]
    description: Option<String>,
    run: Vec<String>,
}

/// A provider backed by commands in a directory.
#[derive(Debug)]
pub struct ExternalProvider {
    descriptor: ModuleDescriptor,
    root: PathBuf,
    commands: Vec<Vec<String>>,
}

/// Read and validate the provider at `load_path`, expecting it to declare `module`.
pub fn load(module: &str, load_path: &Path) -> Result<ExternalProvider> {
    let fail = |reason: String| BoardDocError::ProviderLoad {
        module: module.to_string(),
        path: load_path.to_path_buf(),
        reason,
    };

    if !load_path.is_dir() {
        return Err(fail("provider directory does not exist".to_string()));
    }

    let manifest_path = load_path.join(MANIFEST_FILE);
    let text = fs::read_to_string(&manifest_path)
        .map_err(|e| fail(format!("cannot read {}: {}", MANIFEST_FILE, e)))?;
    let manifest: Manifest = serde_yaml::from_str(&text)
        .map_err(|e| fail(format!("malformed {}: {}", MANIFEST_FILE, e)))?;

    if manifest.name != module {
        return Err(fail(format!(
            "provider declares module '{}', configuration expects '{}'",
            manifest.name, module
        )));
    }

    let mut operations = Vec::with_capacity(manifest.checks.len());
    let mut commands = Vec::with_capacity(manifest.checks.len());
    for check in manifest.checks {
        if check.run.is_empty() {
            return Err(fail(format!("check '{}' has an empty run command", check.name)));
        }
        let description = check.description.unwrap_or_else(|| check.name.clone());
        operations.push(Operation::new(check.name, description));
        commands.push(check.run);
    }

    let descriptor = ModuleDescriptor {
        name: manifest.name,
        origin: ModuleOrigin::External {
            load_path: load_path.to_path_buf(),
        },
        required: manifest.required,
        operations,
    };
    descriptor.validate().map_err(fail)?;

    Ok(ExternalProvider {
        descriptor,
        root: load_path.to_path_buf(),
        commands,
    })
}

impl ExternalProvider {
    fn command_for(&self, operation: &str) -> Option<&[String]> {
        self.descriptor
            .operations
            .iter()
            .position(|o| o.name == operation)
            .map(|i| self.commands[i].as_slice())
    }

    /// Run `argv` to completion, or until `timeout` passes.
    ///
    /// Returns `None` when the process had to be killed.
    fn spawn(&self, operation: &str, argv: &[String], payload: &str, timeout: Option<Duration>) -> io::Result<Option<Output>> {
        // Program paths with a separator are relative to the provider directory.
        let program = if argv[0].contains('/') {
            self.root.join(&argv[0])
        } else {
            PathBuf::from(&argv[0])
        };

        let mut child = Command::new(program)
            .args(&argv[1..])
            .current_dir(&self.root)
            .env(PARAMS_ENV, payload)
            .env(CHECK_ENV, operation)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let deadline = timeout.map(|t| Instant::now() + t);

        // stdin is fed while stdout and stderr drain, so neither side can
        // stall on a full pipe.
        let stdin = child.stdin.take();
        let payload = payload.to_owned();
        let writer = thread::spawn(move || write_payload(stdin, &payload));
        let stdout = child.stdout.take().map(|pipe| thread::spawn(move || read_pipe(pipe)));
        let stderr = child.stderr.take().map(|pipe| thread::spawn(move || read_pipe(pipe)));

        let status = match deadline {
            None => child.wait()?,
            Some(deadline) => match wait_until(&mut child, deadline)? {
                Some(status) => status,
                None => {
                    // Fails only when the process exited in the meantime.
                    let _ = child.kill();
                    child.wait()?;
                    debug!(pid = child.id(), operation, "killed check process after timeout");
                    // The pipe readers stay detached: a grandchild may still hold the pipes.
                    return Ok(None);
                }
            },
        };

        writer.join().unwrap_or(Ok(()))?;
        Ok(Some(Output {
            status,
            stdout: join_pipe(stdout),
            stderr: join_pipe(stderr),
        }))
    }

    fn execute(&self, operation: &str, params: &Instance, timeout: Option<Duration>) -> Outcome {
        let Some(argv) = self.command_for(operation) else {
            return unknown_operation(&self.descriptor.name, operation);
        };

        let payload = match serde_json::to_string(params) {
            Ok(p) => p,
            Err(e) => return Outcome::errored(format!("cannot encode parameters: {}", e)),
        };

        debug!(module = %self.descriptor.name, operation, command = ?argv, "running external check");
        let output = match self.spawn(operation, argv, &payload, timeout) {
            Ok(Some(output)) => output,
            Ok(None) => {
                let secs = timeout.map(|t| t.as_secs_f64()).unwrap_or_default();
                return Outcome::errored(format!("timed out after {}s, check process killed", secs));
            }
            Err(e) => return Outcome::errored(format!("failed to run '{}': {}", argv[0], e)),
        };

        let text = collect_output(&output);
        match output.status.code() {
            Some(0) => Outcome::passed(if text.is_empty() { "exit status 0".to_string() } else { text }),
            Some(EXIT_FAILED) => Outcome::failed(if text.is_empty() { "exit status 1".to_string() } else { text }),
            Some(code) => Outcome::errored(format!("exit status {}: {}", code, text)),
            None => Outcome::errored(format!("terminated by signal: {}", text)),
        }
    }
}

impl CheckProvider for ExternalProvider {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn run(&self, operation: &str, params: &Instance) -> Outcome {
        self.execute(operation, params, None)
    }

    fn run_with_timeout(&self, operation: &str, params: &Instance, timeout: Duration) -> Outcome {
        self.execute(operation, params, Some(timeout))
    }
}

pub(crate) fn write_payload(stdin: Option<ChildStdin>, payload: &str) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    // A check that ignores stdin may exit before reading it.
    match stdin.write_all(payload.as_bytes()) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
        _ => Ok(()),
    }
}

fn read_pipe(mut pipe: impl Read) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf);
    buf
}

fn join_pipe(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.map(|r| r.join().unwrap_or_default()).unwrap_or_default()
}

fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn collect_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    match (stdout.trim(), stderr.trim()) {
        ("", err) => err.to_string(),
        (out, "") => out.to_string(),
        (out, err) => format!("{}\n{}", out, err),
    }
}
