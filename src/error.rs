//! Engine errors: snapshot validation failures surfaced to the caller.

use crate::grid::Pos;
use thiserror::Error;

/// Failures that stop a grid from being installed. Selection problems are not errors;
/// see [`crate::turn::Rejection`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid tile code {code:?} at {pos}")]
    InvalidTileCode { code: String, pos: Pos },
    #[error("snapshot holds {actual} tile codes but a {width}x{height} grid needs {expected}")]
    SnapshotSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
}
