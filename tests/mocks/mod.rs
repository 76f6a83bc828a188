//! Mock implementations for testing without board hardware.
//!
//! Provides simulated I2C, GPIO and video backends plus helpers that write
//! description files and external providers into temporary directories.

pub mod fixtures;
pub mod hardware;

pub use fixtures::*;
pub use hardware::*;
