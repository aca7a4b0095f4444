//! Targets used with the [log] macros, to narrow output to one part of a run.
//!
//! No logger is installed by the library.

pub mod targets {
    /// The coordinator: loading, classification, progress, merging.
    pub const ENGINE: &str = "engine";

    /// Backbone queries.
    pub const ORACLE: &str = "oracle";

    /// Thread validation and range assignment.
    pub const PARTITION: &str = "partition";

    /// Per-variable edge extraction.
    pub const WORKER: &str = "worker";

    /// Output files.
    pub const OUTPUT: &str = "output";
}
