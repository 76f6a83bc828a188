//! Host identification for report headers and the system report.

use std::fs;
use std::process::Command;

/// Hostname from `/etc/hostname`, then `/proc/sys/kernel/hostname`, then `$HOSTNAME`.
pub fn hostname() -> Option<String> {
    ["/etc/hostname", "/proc/sys/kernel/hostname"]
        .iter()
        .filter_map(|path| fs::read_to_string(path).ok())
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok().filter(|s| !s.is_empty()))
}

/// Whether the process runs as root, according to `id -u`.
pub fn is_superuser() -> bool {
    Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .is_some_and(|uid| uid.trim() == "0")
}
