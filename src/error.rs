//! Error types for crossfield.
//!
//! Every stage of the pipeline reports failures through [`Error`]. Input problems
//! are reported before any solve starts as [`Error::MeshValidation`]; numerical
//! failures of the global solves leave no partial state behind and can be retried
//! with different options.

use thiserror::Error;

use crate::algo::parameterize::ParametrizedMesh;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Problems found while validating an input mesh or its constraints.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face repeats a vertex index.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A face has (numerically) zero area.
    #[error("face {face} has zero area")]
    ZeroAreaFace {
        /// The face index.
        face: usize,
    },

    /// A vertex position is NaN or infinite.
    #[error("vertex {vertex} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// The vertex index.
        vertex: usize,
    },

    /// A vertex is not referenced by any face.
    #[error("vertex {vertex} is not referenced by any face")]
    IsolatedVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// An edge is shared by more than two faces, or traversed twice in the same
    /// direction (inconsistent orientation).
    #[error("edge ({v0}, {v1}) is non-manifold or inconsistently oriented")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// The faces around a vertex do not form a single fan.
    #[error("vertex {vertex} is non-manifold")]
    NonManifoldVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// A direction constraint is unusable.
    #[error("constraint on face {face} is invalid: {reason}")]
    InvalidConstraint {
        /// The constrained face index.
        face: usize,
        /// Why the constraint was rejected.
        reason: &'static str,
    },
}

/// Errors that can occur while designing a field or computing a parametrization.
#[derive(Error, Debug)]
pub enum Error {
    /// The input mesh or constraints failed validation.
    #[error("mesh validation failed: {0}")]
    MeshValidation(#[from] ValidationError),

    /// A sparse linear system could not be set up or is singular.
    #[error("{stage} solver failed: {reason}")]
    Solver {
        /// Pipeline stage that owns the system.
        stage: &'static str,
        /// Description of the failure.
        reason: String,
    },

    /// An iterative linear solve did not converge.
    #[error("{stage} solver failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Pipeline stage that owns the system.
        stage: &'static str,
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// A field vector vanished after an otherwise valid solve.
    #[error("field vector on face {face} has zero length")]
    DegenerateField {
        /// The face with the degenerate vector.
        face: usize,
    },

    /// Integer rounding did not finish within its budget, or the result folds.
    ///
    /// The best continuous solution is returned as `degraded` so callers can
    /// inspect or still use it.
    #[error("mixed-integer optimization failed: {reason} ({unrounded} integer variables left unrounded)")]
    Optimization {
        /// Description of the failure.
        reason: String,
        /// Number of integer variables that were still continuous.
        unrounded: usize,
        /// Best available (continuous or partially rounded) result.
        degraded: Box<ParametrizedMesh>,
    },

    /// A correspondence query used an id outside the valid range.
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Which index space the id belongs to.
        kind: &'static str,
        /// The offending id.
        index: usize,
        /// Number of valid ids.
        len: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a solver error for the given stage.
    pub(crate) fn solver(stage: &'static str, reason: impl Into<String>) -> Self {
        Error::Solver {
            stage,
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry with adjusted options.
    ///
    /// Validation and index errors are properties of the input; solver and
    /// optimization failures may go away with a different configuration.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Solver { .. }
                | Error::ConvergenceFailed { .. }
                | Error::DegenerateField { .. }
                | Error::Optimization { .. }
        )
    }
}
