//! Crate-root error aggregation.
//!
//! Each module owns a `thiserror::Error` enum scoped to its own failure
//! modes (`ScenarioError`, `RegistryError`, ...); this enum is the thin
//! umbrella that callers crossing module boundaries actually hold, mirroring
//! how the donor crate's `ProveError`/`VerifySchedError` wrap the leaf
//! errors of `domain.rs`/`quotient.rs`/`pcs.rs` behind `#[from]`.

use crate::constraints::ConstraintError;
use crate::generator::GeneratorError;
use crate::moment_matrix::MomentMatrixError;
use crate::registry::RegistryError;
use crate::scenario::ScenarioError;
use crate::valuation::ValuationError;

/// Top-level error type surfaced by [`crate::program::InflationProgram`].
#[derive(Debug, thiserror::Error)]
pub enum InflationError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    MomentMatrix(#[from] MomentMatrixError),
    #[error(transparent)]
    Constraint(#[from] ConstraintError),
    #[error(transparent)]
    Valuation(#[from] ValuationError),
    /// The external solver returned a non-feasible/unknown status; the
    /// status string is propagated unchanged (distilled §7).
    #[error("solver reported status: {0}")]
    SolverStatus(String),
}
