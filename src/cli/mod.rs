//! Command Line Interface (CLI) layer for headshot.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for a single run. It wires
//! user-provided options to the library functionality exposed via
//! `headshot::api`.
//!
//! If you are embedding headshot into another application, prefer using
//! the high-level `headshot::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
