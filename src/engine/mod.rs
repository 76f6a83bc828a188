//! Check engine.
//!
//! Binds instances to provider operations, runs the bound units in order, and
//! folds their outcomes into a report.

pub mod binder;
pub mod orchestrator;
pub mod result;
