//! Build script for board-doc.
//!
//! Embeds version information from git and the toolchain. Every variable is
//! always set so the crate can read them with `env!`.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    println!(
        "cargo:rustc-env=BOARD_DOC_TARGET={}",
        env::var("TARGET").unwrap_or_else(|_| "unknown".to_string())
    );
    println!(
        "cargo:rustc-env=BOARD_DOC_GIT_HASH={}",
        get_git_hash().unwrap_or_else(|| "unknown".to_string())
    );
    println!(
        "cargo:rustc-env=BOARD_DOC_BUILD_DATE={}",
        get_build_date().unwrap_or_else(|| "unknown".to_string())
    );
    println!(
        "cargo:rustc-env=BOARD_DOC_RUSTC_VERSION={}",
        get_rustc_version().unwrap_or_else(|| "unknown".to_string())
    );
}

/// Run a command and return its trimmed stdout when it succeeds
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Get the current git commit hash (short form)
fn get_git_hash() -> Option<String> {
    command_output("git", &["rev-parse", "--short", "HEAD"])
}

/// Get the current build date in ISO 8601 format
fn get_build_date() -> Option<String> {
    command_output("date", &["-u", "+%Y-%m-%dT%H:%M:%SZ"])
}

/// Get the rustc version: "rustc 1.75.0 (..." -> "1.75.0"
fn get_rustc_version() -> Option<String> {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    command_output(&rustc, &["--version"])
        .and_then(|s| s.split_whitespace().nth(1).map(str::to_string))
}
