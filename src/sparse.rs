//! Sparse coordinate-form program export (distilled §6 "External
//! interfaces").
//!
//! Everything upstream of this module speaks in [`CompoundId`]s; a solver
//! or a human reading a dumped problem wants symbolic names instead. This
//! module is the single place that crosses from one to the other, by way
//! of [`crate::naming`].

use std::collections::HashMap;

use crate::constraints::{ConstraintSystem, RelOp};
use crate::moment_matrix::MomentMatrix;
use crate::registry::{CompoundId, MonomialRegistry, ONE_ID, ZERO_ID};
use crate::valuation::{Bound, ValuationEngine};

fn name_of(registry: &MonomialRegistry, id: CompoundId) -> String {
    if id == ZERO_ID {
        "0".to_string()
    } else if id == ONE_ID {
        "1".to_string()
    } else {
        registry
            .compound(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("<unregistered:{id}>"))
    }
}

/// A linear relation rendered with symbolic term names instead of ids.
#[derive(Debug, Clone)]
pub struct NamedRelation {
    pub terms: Vec<(String, f64)>,
    pub rhs: f64,
}

/// The full relaxation, rendered for a solver or a human: coordinate-form
/// objective, known/semiknown value maps, equality/inequality rows,
/// bounds, and (SDP path only) the moment matrix itself, all keyed by
/// symbolic monomial name rather than internal id (distilled §6).
#[derive(Debug, Clone, Default)]
pub struct SparseProgram {
    pub objective: Vec<(String, f64)>,
    pub objective_constant: f64,
    pub known_vars: HashMap<String, f64>,
    pub semiknown_vars: HashMap<String, (f64, String)>,
    pub equalities: Vec<NamedRelation>,
    pub inequalities: Vec<NamedRelation>,
    pub lower_bounds: HashMap<String, f64>,
    pub upper_bounds: HashMap<String, f64>,
    /// Present only when a [`MomentMatrix`] was supplied (the SDP path).
    pub moment_matrix: Option<Vec<Vec<String>>>,
}

#[allow(clippy::too_many_arguments)]
pub fn build_sparse_program(
    registry: &MonomialRegistry,
    moment_matrix: Option<&MomentMatrix>,
    constraints: &ConstraintSystem,
    valuation: &ValuationEngine,
    objective: &[(CompoundId, f64)],
    supports_mode: bool,
) -> SparseProgram {
    let (processed_objective, objective_constant) = valuation.processed_objective(objective);
    let objective = processed_objective
        .into_iter()
        .map(|(id, coeff)| (name_of(registry, id), coeff))
        .collect();

    let mut known_vars = HashMap::new();
    let mut semiknown_vars = HashMap::new();
    for (id, bound) in valuation.bounds(supports_mode) {
        if let Bound::Fixed(v) = bound {
            known_vars.insert(name_of(registry, id), v);
        }
    }
    for (id, coeff, remaining) in valuation.splits() {
        semiknown_vars.insert(name_of(registry, id), (coeff, name_of(registry, remaining)));
    }

    let render = |rel: &crate::constraints::LinearRelation| NamedRelation {
        terms: rel.terms.iter().map(|&(id, c)| (name_of(registry, id), c)).collect(),
        rhs: rel.rhs,
    };
    let equalities = constraints
        .equalities
        .iter()
        .filter(|r| r.op == RelOp::Eq)
        .map(render)
        .collect();
    let inequalities = constraints
        .inequalities
        .iter()
        .filter(|r| r.op == RelOp::Le)
        .map(render)
        .collect();

    let mut lower_bounds = HashMap::new();
    let mut upper_bounds = HashMap::new();
    for (id, bound) in valuation.bounds(supports_mode) {
        lower_bounds.insert(name_of(registry, id), bound.lower());
        if let Some(hi) = bound.upper() {
            upper_bounds.insert(name_of(registry, id), hi);
        }
    }

    let moment_matrix = moment_matrix.map(|mm| {
        (0..mm.size)
            .map(|i| (0..mm.size).map(|j| name_of(registry, mm.get(i, j))).collect())
            .collect()
    });

    SparseProgram {
        objective,
        objective_constant,
        known_vars,
        semiknown_vars,
        equalities,
        inequalities,
        lower_bounds,
        upper_bounds,
        moment_matrix,
    }
}
