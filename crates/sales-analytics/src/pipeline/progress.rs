//! Progress reporting for the analytics pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_analytics::Pipeline;
//!
//! let output = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run_path("superstore.csv")?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the analytics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading the source file and parsing typed columns
    Loading,
    /// Pruning, deduplication, text repair, label normalization
    Cleaning,
    /// Deriving retail price and per-item profit
    Enriching,
    /// Building entity and time-bucketed summaries
    Aggregating,
    /// Cutting top and bottom cohorts
    CohortSelection,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Cleaning => "Cleaning Data",
            Self::Enriching => "Enriching Records",
            Self::Aggregating => "Aggregating",
            Self::CohortSelection => "Selecting Cohorts",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    ///
    /// Weights of the working stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.25,
            Self::Cleaning => 0.25,
            Self::Enriching => 0.10,
            Self::Aggregating => 0.30,
            Self::CohortSelection => 0.10,
            Self::Complete => 0.0,
            Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Cleaning => 0.25,
            Self::Enriching => 0.50,
            Self::Aggregating => 0.60,
            Self::CohortSelection => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update emitted between and within stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Optional sub-stage description (e.g., "Customers", "Monthly")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage without sub-stage info.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a new progress update with sub-stage information.
    pub fn with_sub_stage(
        stage: PipelineStage,
        sub_stage: impl Into<String>,
        stage_progress: f32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sub_stage: Some(sub_stage.into()),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            sub_stage: None,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            sub_stage: None,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates from the pipeline.
///
/// Implementations must be `Send + Sync` so a pipeline can be moved to a
/// worker thread while reporting elsewhere.
pub trait ProgressReporter: Send + Sync {
    /// Called at each stage boundary and between sub-stages.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
static_assertions::assert_impl_all!(PipelineStage: Send, Sync, Copy);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(PipelineStage::Cleaning, 0.5, "Cleaning...");
        assert_eq!(update.stage, PipelineStage::Cleaning);
        assert!(update.sub_stage.is_none());
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.375).abs() < 1e-6);
    }

    #[test]
    fn test_progress_update_with_sub_stage() {
        let update = ProgressUpdate::with_sub_stage(
            PipelineStage::Aggregating,
            "Customers",
            0.0,
            "Summarizing customers",
        );
        assert_eq!(update.sub_stage, Some("Customers".to_string()));
        assert_eq!(update.progress, 0.60);
    }

    #[test]
    fn test_progress_update_complete() {
        let update = ProgressUpdate::complete("Done!");
        assert_eq!(update.stage, PipelineStage::Complete);
        assert_eq!(update.progress, 1.0);
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(PipelineStage::Loading, 0.5, "Test"));
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stage_weights_sum() {
        let stages = [
            PipelineStage::Loading,
            PipelineStage::Cleaning,
            PipelineStage::Enriching,
            PipelineStage::Aggregating,
            PipelineStage::CohortSelection,
        ];

        let total_weight: f32 = stages.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.01, "Weights should sum to ~1.0");

        for pair in stages.windows(2) {
            let end = pair[0].base_progress() + pair[0].weight();
            assert!((end - pair[1].base_progress()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_stage_json_values() {
        let stage_expectations = [
            (PipelineStage::Loading, "\"loading\""),
            (PipelineStage::CohortSelection, "\"cohort_selection\""),
            (PipelineStage::Failed, "\"failed\""),
        ];

        for (stage, expected_json) in stage_expectations {
            let json = serde_json::to_string(&stage).expect("Should serialize");
            assert_eq!(json, expected_json);
        }
    }

    #[test]
    fn test_progress_reporter_across_threads() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = Arc::new(ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let reporter_clone = reporter.clone();
        let handle = std::thread::spawn(move || {
            reporter_clone.report(ProgressUpdate::new(
                PipelineStage::Enriching,
                0.5,
                "Test from background thread",
            ));
        });

        handle.join().expect("Thread should not panic");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}
