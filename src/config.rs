use std::path::{Path, PathBuf};

use crate::io::graph::OutputPaths;

/// Settings of one analysis run.
#[derive(Clone, Debug)]
pub struct Config {
    pub input: PathBuf,
    /// Defaults to the directory of `input`.
    pub output_dir: Option<PathBuf>,
    /// Backbone detection strategy, `one` or `without`.
    pub strategy: String,
    pub threads: usize,
    /// Leave variables named `aux_*` out of the analysis.
    pub filter_auxiliary: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output_dir: None,
            strategy: "one".to_owned(),
            threads: 1,
            filter_auxiliary: false,
        }
    }
}

impl Config {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    pub fn output_dir(&self) -> &Path {
        match &self.output_dir {
            Some(dir) => dir.as_path(),
            None => self.input.parent().unwrap_or(Path::new("")),
        }
    }

    /// Stem of the input file, shared by every output.
    pub fn basename(&self) -> String {
        self.input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths::new(self.output_dir(), &self.basename())
    }
}
