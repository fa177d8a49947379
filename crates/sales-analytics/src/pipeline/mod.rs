//! Pipeline module.
//!
//! This module wires the loader, cleaner, enricher, aggregator and cohort
//! selector into a single run.

mod builder;
mod output;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use output::{CohortComparison, Cohorts, PipelineOutput};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
