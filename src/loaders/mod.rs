//! CSV loaders for the three per-train input tables.
//!
//! Each loader reads one file per train from its own directory, applies the
//! fixed filters described in the analysis protocol, and returns normalized
//! in-memory events. Missing files and empty tables are reported as errors so
//! the pipeline can log and skip the train.

pub mod composition;
pub mod diagnostics;
pub mod maintenance;

pub use composition::load_composition;
pub use diagnostics::load_diagnostics;
pub use maintenance::load_maintenance;
