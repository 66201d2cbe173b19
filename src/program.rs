//! Top-level program facade (distilled §5 "Concurrency & resource model",
//! §9 design note: LP and SDP are two variants of one interface, not a
//! subtype relationship — an `InflationProgram` is built the same way
//! either way, and `moment_matrix` is simply `None` on the LP path.

use std::collections::HashMap;

use crate::commutation::CommutationOracle;
use crate::constraints::{collins_gisin_fold_inequalities, normalization_equalities, ConstraintSystem};
use crate::error::InflationError;
use crate::generator::{build_generators, ColumnSpec};
use crate::moment_matrix::{build_moment_matrix, MomentMatrix};
use crate::operator::OperatorAlphabet;
use crate::registry::{AtomicId, CompoundId, MonomialRegistry};
use crate::scenario::{CausalScenario, Distribution};
use crate::sparse::{build_sparse_program, SparseProgram};
use crate::symmetry::SymmetryGroup;
use crate::valuation::ValuationEngine;

/// Owns the full pipeline for one causal scenario: alphabet through
/// constraints, built once and then reusable across distributions and
/// objectives (distilled §5: "the expensive, scenario-scale structures are
/// built once; per-distribution work is cheap").
pub struct InflationProgram<'s> {
    scenario: &'s CausalScenario,
    alphabet: &'s OperatorAlphabet,
    symmetry: &'s SymmetryGroup,
    registry: MonomialRegistry<'s>,
    generators: Vec<CompoundId>,
    moment_matrix: Option<MomentMatrix>,
    constraints: ConstraintSystem,
    valuation: ValuationEngine,
    only_specified_values: bool,
}

impl<'s> InflationProgram<'s> {
    /// Builds the scenario-scale structures: alphabet through generator
    /// set and constraints. `sdp = true` additionally builds the
    /// symmetry-quotiented moment matrix (distilled §4.H); `sdp = false`
    /// is the LP path, which only ever needs the generator list.
    pub fn build(
        scenario: &'s CausalScenario,
        alphabet: &'s OperatorAlphabet,
        nc: &'s CommutationOracle,
        symmetry: &'s SymmetryGroup,
        spec: &ColumnSpec,
        sdp: bool,
        only_specified_values: bool,
    ) -> Result<Self, InflationError> {
        let mut registry = MonomialRegistry::new(scenario, alphabet, nc, symmetry);
        let generators = build_generators(spec, &mut registry)?;

        let moment_matrix = if sdp {
            Some(build_moment_matrix(&generators, &mut registry, symmetry)?)
        } else {
            None
        };

        let mut constraints = ConstraintSystem::default();
        constraints
            .equalities
            .extend(normalization_equalities(scenario, &mut registry, &generators));
        constraints
            .inequalities
            .extend(collins_gisin_fold_inequalities(scenario, &mut registry, &generators));

        Ok(Self {
            scenario,
            alphabet,
            symmetry,
            registry,
            generators,
            moment_matrix,
            constraints,
            valuation: ValuationEngine::new(only_specified_values),
            only_specified_values,
        })
    }

    pub fn scenario(&self) -> &CausalScenario {
        self.scenario
    }

    pub fn alphabet(&self) -> &OperatorAlphabet {
        self.alphabet
    }

    pub fn symmetry(&self) -> &SymmetryGroup {
        self.symmetry
    }

    pub fn registry(&self) -> &MonomialRegistry<'s> {
        &self.registry
    }

    pub fn generators(&self) -> &[CompoundId] {
        &self.generators
    }

    pub fn moment_matrix(&self) -> Option<&MomentMatrix> {
        self.moment_matrix.as_ref()
    }

    pub fn constraints(&self) -> &ConstraintSystem {
        &self.constraints
    }

    /// Re-runs component J against a new distribution, or against a bare
    /// explicit value map when `only_specified_values` is set (distilled
    /// §4.J). Cheap relative to `build`: it only re-walks the already
    /// interned atoms and compounds.
    pub fn set_distribution(
        &mut self,
        dist: Option<&Distribution>,
        explicit_atom_values: &HashMap<AtomicId, f64>,
    ) {
        self.valuation.reset_values();
        let mut engine = ValuationEngine::new(self.only_specified_values);
        engine.set_values(dist, explicit_atom_values, &mut self.registry, &self.generators);
        self.valuation = engine;
    }

    pub fn valuation(&self) -> &ValuationEngine {
        &self.valuation
    }

    /// Renders the current state as a [`SparseProgram`] ready for a
    /// solver or for display (distilled §6).
    pub fn export(&self, objective: &[(CompoundId, f64)], supports_mode: bool) -> SparseProgram {
        build_sparse_program(
            &self.registry,
            self.moment_matrix.as_ref(),
            &self.constraints,
            &self.valuation,
            objective,
            supports_mode,
        )
    }
}
