//! Errors of an analysis run.
//!
//! Every variant names the stage that failed, so the `Display` output of an
//! error is enough to tell a user what went wrong.

use std::path::PathBuf;

use thiserror::Error;

use crate::{backbone::OracleError, io::LoadError, types::Var};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The formula is unreadable or not valid DIMACS.
    #[error("the formula {} could not be loaded: {source}", path.display())]
    Load { path: PathBuf, source: LoadError },

    /// Unknown backbone detection strategy.
    #[error("unknown backbone detection strategy `{0}`")]
    Strategy(String),

    /// Zero threads, or more than the machine offers.
    #[error("requested {requested} threads but {available} are available (at least one is required)")]
    ThreadCount { requested: usize, available: usize },

    #[error("backbone computation failed: {0}")]
    Oracle(#[from] OracleError),

    /// The global backbone holds a variable with both polarities.
    #[error("variable {0} is both core and dead in the global backbone")]
    Contradiction(Var),

    /// A worker failed while processing its range.
    #[error("worker {index} failed: {message}")]
    Worker { index: usize, message: String },

    /// An output directory or file could not be written.
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
