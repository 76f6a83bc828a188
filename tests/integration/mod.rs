//! Integration tests for board-doc.
//!
//! These tests run complete descriptions against simulated hardware and
//! script-backed external providers.

pub mod cli_tests;
pub mod full_run_tests;
pub mod output_tests;
