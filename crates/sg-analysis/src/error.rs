//! Error types for sg-analysis

use thiserror::Error;

/// Failures inside one analysis run.
///
/// These never escape [`crate::RelationshipAnalyzer::analyze_relationships`];
/// they are turned into a failed result instead.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// AE001: Core engine error propagation
    #[error("[AE001] Core error: {0}")]
    Core(#[from] sg_core::CoreError),

    /// AE002: A pipeline stage panicked
    #[error("[AE002] Analysis aborted unexpectedly during {stage}: {message}")]
    Panicked { stage: String, message: String },
}

/// Result type alias for AnalysisError
pub type AnalysisResult<T> = Result<T, AnalysisError>;
