//! board-doc CLI entry point
//!
//! Runs the hardware checks described by a YAML file against the local board,
//! or collects a system report archive with `--system-report`.

use anyhow::Context;
use board_doc::cli::args::Args;
use board_doc::cli::output::{get_formatter, render_docs, CsvFormatter, JunitFormatter, OutputFormatter};
use board_doc::platform::Hardware;
use board_doc::telemetry::init_tracing;
use board_doc::{exit_status, generate_system_report, list_groups, plan_checks, run_checks, RunConfig};
use clap::Parser;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

/// Exit status for errors that prevent a run.
const EXIT_RUNTIME_ERROR: u8 = 3;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_json, args.log_level());

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
    if let Some(archive) = &args.system_report {
        let report = generate_system_report(&args.config, archive)?;
        print!("{}", report);
        return Ok(ExitCode::SUCCESS);
    }

    if args.list_groups {
        for group in list_groups(&args.config)? {
            println!("{}", group);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = RunConfig::from_args(args);

    if let Some(path) = &args.generate_docs {
        let plan = plan_checks(&config, Hardware::system())?;
        write_file(path, &render_docs(&plan))?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = run_checks(&config, Hardware::system())?;

    let no_color = args.no_color || std::env::var_os("NO_COLOR").is_some();
    let formatter = get_formatter(args.format, no_color, args.verbose, args.quiet);
    println!("{}", formatter.format(&report));

    if let Some(path) = &args.output {
        write_file(path, &JunitFormatter::new().format(&report))?;
    }
    if let Some(path) = &args.csv {
        write_file(path, &CsvFormatter::new().format(&report))?;
    }

    Ok(ExitCode::from(exit_status(&report)))
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote report");
    Ok(())
}
