//! Requires/excludes graphs of a propositional formula, extracted from
//! backbones computed under single-variable assumptions.

pub mod backbone;
pub mod classify;
pub mod config;
pub mod error;
pub mod io;
pub mod misc;
pub mod parallel;
pub mod partition;
pub mod process;
pub mod solver;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use parallel::{analyze, analyze_with, Analysis};
