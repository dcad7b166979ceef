//! Verification harness for the tsf formatting engine.
//!
//! This crate provides:
//! - Argument specs: `kind:value` strings parsed into owned values
//! - Fixtures: JSON files of format strings, arguments and expected output
//! - Runner + verify: execute fixtures and collect per-case results
//! - Report generation: markdown + JSON reports with a SHA-256 artifact index
//! - Structured logging: one JSONL record per verified case

#![forbid(unsafe_code)]

pub mod args;
pub mod diff;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod structured_log;
pub mod verify;

pub use args::{ArgSpec, ArgSpecError};
pub use fixtures::{EscapeMode, FixtureCase, FixtureError, FixtureSet};
pub use report::VerificationReport;
pub use runner::TestRunner;
pub use verify::{VerificationResult, VerificationSummary};
