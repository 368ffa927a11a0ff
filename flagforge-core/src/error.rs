//! Error types for the resolution engine

use thiserror::Error;

/// Errors surfaced to callers of the evaluation path
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// The evaluation request itself is malformed
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The edge store is required for this project but could not be used
    #[error("Edge store unavailable: {0}")]
    EdgeStoreUnavailable(String),
}

/// Structural failures inside a segment's rule tree
///
/// These are never raised for unknown operators or missing traits (those
/// fail closed); only a corrupt tree aborts evaluation of the segment.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentEvaluationError {
    /// A rule was reached twice while walking the tree
    #[error("Cycle detected in rule tree at rule {0}")]
    CycleDetected(usize),

    /// A child rule index points outside the segment's rule arena
    #[error("Rule {0} does not exist in this segment")]
    UnknownRule(usize),
}

/// Write-time validation failures on model objects
#[derive(Error, Debug)]
pub enum ModelError {
    /// Multivariate allocations must leave the remainder for the base value
    #[error("Multivariate allocations sum to {total}, exceeding 100")]
    AllocationOverflow { total: f64 },

    /// A feature state may target a segment or an identity, never both
    #[error("Feature state {0} targets both a segment and an identity")]
    ConflictingScope(u64),
}
