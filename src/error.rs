use thiserror::Error;

use crate::geometry::SpacetimePoint;

/// Fatal problems that abort the evaluation of a single ray.
///
/// Missing intersections are not errors, they show up as `false` / `None`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("Metric breaks down at {0:?}")]
    InvalidSpacetimePoint(SpacetimePoint),

    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("Chart mismatch: expected chart {expected}, got {found}")]
    ChartMismatch { expected: usize, found: usize },

    #[error("Tetrad basis is not invertible")]
    DegenerateBasis,

    #[error("Velocity {0} is not below the speed of light")]
    InvalidVelocity(f64),

    #[error("A ray needs at least two points, got {0}")]
    TooFewPoints(usize),
}
