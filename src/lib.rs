//! Crate root: public surface and module map for the causal-inflation
//! monomial engine.
//!
//! A scenario (parties, latent sources, the bipartite hypergraph between
//! them, and inflation levels) is turned into a finite operator alphabet,
//! canonicalized and factored under the inflation symmetry group, and
//! assembled into either an LP or an SDP relaxation certifying
//! compatibility of an observed distribution with the causal structure.
//!
//! ## Pipeline
//!
//! `scenario` -> `operator` (alphabet) -> `commutation` (oracle) ->
//! `canon` + `factor` + `symmetry` (the canonicalizer) -> `registry`
//! (interning) -> `generator` (candidate set) -> `moment_matrix` (SDP) /
//! `constraints` (LP) -> `valuation` (numeric classification) ->
//! `sparse` (solver-facing export). `program` wires the whole pipeline
//! together as one facade.
//!
//! Unsafe code is never needed for any of this: everything is integer
//! bookkeeping and vector/hashmap manipulation.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

/// Crate-root error aggregation.
pub mod error;
/// The immutable causal scenario and distribution inputs.
pub mod scenario;
/// The finite operator alphabet (component A).
pub mod operator;
/// The non-commutation oracle (component B).
pub mod commutation;
/// The canonicalizer: rewrite rules to a normal form or zero (component C).
pub mod canon;
/// Splits a canonical monomial into independent atomic factors (component D).
pub mod factor;
/// The inflation-copy symmetry group (component E).
pub mod symmetry;
/// Symbolic name parsing and pretty-printing.
pub mod naming;
/// The grow-only monomial interning registry (component F).
pub mod registry;
/// Candidate generator-set construction (component G).
pub mod generator;
/// Symmetry-quotiented moment-matrix construction (component H).
pub mod moment_matrix;
/// Normalization/Collins-Gisin/LPI/user constraint assembly (component I).
pub mod constraints;
/// Known/semiknown/free classification against a distribution (component J).
pub mod valuation;
/// Coordinate-form, solver-facing program export.
pub mod sparse;
/// The top-level facade tying the whole pipeline together.
pub mod program;

pub use error::InflationError;
pub use program::InflationProgram;
pub use scenario::{CausalScenario, Distribution, Party, Source};
