//! CLI support for kol-lang
//!
//! Provides programmatic access to the `kol` commands so they can be
//! embedded in other tools.

mod check;

pub use check::{execute_check, CheckOptions, CheckResult};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Kol(#[from] crate::Error),

    #[error("{0}")]
    Config(#[from] crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Pass a file or pipe a program to stdin.")]
    NoInput,
}
