//! Version and build information.
//!
//! Provides version, git commit, and build metadata embedded by `build.rs`.

/// Multi-line text for `--version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nCommit: ",
    env!("BOARD_DOC_GIT_HASH"),
    "\nBuilt: ",
    env!("BOARD_DOC_BUILD_DATE"),
    "\nTarget: ",
    env!("BOARD_DOC_TARGET"),
    "\nRustc: ",
    env!("BOARD_DOC_RUSTC_VERSION"),
);
