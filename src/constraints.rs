//! Constraint assembler (component I, distilled §4.I).
//!
//! Builds the linear relations an LP relaxation solves over: party
//! normalization equalities, Collins-Gisin fold inequalities at leaf
//! parties, optional LPI (linearized partial information) equalities, and
//! caller-supplied equalities/inequalities. Every relation is expressed
//! purely in terms of interned [`CompoundId`]s and coefficients — this
//! module never looks at operator tuples directly, only at the registry.

use std::collections::HashSet;

use crate::registry::{CompoundId, MonomialRegistry};
use crate::scenario::CausalScenario;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    #[error("linear relation has no terms")]
    EmptyRelation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    /// `terms . x <= rhs`.
    Le,
}

/// One row of the constraint system: `sum_k coeff_k * x[monomial_k] (op) rhs`.
#[derive(Debug, Clone)]
pub struct LinearRelation {
    pub terms: Vec<(CompoundId, f64)>,
    pub op: RelOp,
    pub rhs: f64,
}

impl LinearRelation {
    fn new(terms: Vec<(CompoundId, f64)>, op: RelOp, rhs: f64) -> Result<Self, ConstraintError> {
        if terms.is_empty() {
            return Err(ConstraintError::EmptyRelation);
        }
        Ok(Self { terms, op, rhs })
    }
}

/// The assembled constraint system, excluding bounds (owned by the
/// valuation engine, distilled §4.J).
#[derive(Debug, Default)]
pub struct ConstraintSystem {
    pub equalities: Vec<LinearRelation>,
    pub inequalities: Vec<LinearRelation>,
}

impl ConstraintSystem {
    pub fn push_user_equality(&mut self, terms: Vec<(CompoundId, f64)>, rhs: f64) -> Result<(), ConstraintError> {
        self.equalities.push(LinearRelation::new(terms, RelOp::Eq, rhs)?);
        Ok(())
    }

    pub fn push_user_inequality(&mut self, terms: Vec<(CompoundId, f64)>, rhs: f64) -> Result<(), ConstraintError> {
        self.inequalities.push(LinearRelation::new(terms, RelOp::Le, rhs)?);
        Ok(())
    }

    /// Appends LPI equalities derived from the valuation engine's
    /// known/unknown splits (distilled §4.J "semiknown"): for each
    /// `(compound, coeff, known_sub)` triple, `compound - coeff *
    /// known_sub = 0` once `known_sub`'s value is substituted by the
    /// solver's variable for it. Off by default: the LP path normally
    /// represents these via the lighter-weight `semiknown_vars` map
    /// instead of materializing equality rows (distilled §4.J).
    pub fn push_lpi_equalities(&mut self, splits: &[(CompoundId, f64, CompoundId)]) {
        for &(compound, coeff, known_sub) in splits {
            let terms = vec![(compound, 1.0), (known_sub, -coeff)];
            if let Ok(rel) = LinearRelation::new(terms, RelOp::Eq, 0.0) {
                self.equalities.push(rel);
            }
        }
    }
}

/// For every occurrence, across `monomials`, of an operator belonging to a
/// party with children, emits the normalization equality
/// `sum_{sibling in ortho group} (context with sibling) - (context with
/// the operator erased) = 0` (distilled §4.I "Normalization"). Relations
/// are deduplicated by their term multiset.
pub fn normalization_equalities(
    scenario: &CausalScenario,
    registry: &mut MonomialRegistry,
    monomials: &[CompoundId],
) -> Vec<LinearRelation> {
    let alphabet = registry.alphabet();
    let mut seen: HashSet<(CompoundId, Vec<CompoundId>)> = HashSet::new();
    let mut out = Vec::new();

    for &m in monomials {
        let ranks = registry.ranks_of(m);
        for pos in 0..ranks.len() {
            let op = alphabet.operator(ranks[pos]).clone();
            if !scenario.parties()[op.party as usize].has_children {
                continue;
            }
            let ortho = alphabet.ortho_group_of(&op).to_vec();
            if ortho.len() <= 1 {
                continue;
            }
            let mut context = ranks.clone();
            context.remove(pos);
            let context_id = registry.intern(&context);

            let mut sibling_ids: Vec<CompoundId> = ortho
                .iter()
                .map(|&sib| {
                    let mut seq = context.clone();
                    seq.push(sib);
                    registry.intern(&seq)
                })
                .collect();
            sibling_ids.sort_unstable();

            if !seen.insert((context_id, sibling_ids.clone())) {
                continue;
            }
            let mut terms: Vec<(CompoundId, f64)> =
                sibling_ids.into_iter().map(|id| (id, 1.0)).collect();
            terms.push((context_id, -1.0));
            if let Ok(rel) = LinearRelation::new(terms, RelOp::Eq, 0.0) {
                out.push(rel);
            }
        }
    }
    out
}

/// For every occurrence, across `monomials`, of an operator belonging to a
/// leaf party (no children), emits the Collins-Gisin fold inequality
/// `sum_{sibling in ortho group} (context with sibling) <= (context with
/// the operator erased)` (distilled §4.I "Collins-Gisin fold"): the
/// never-materialized last outcome always carries nonnegative weight.
pub fn collins_gisin_fold_inequalities(
    scenario: &CausalScenario,
    registry: &mut MonomialRegistry,
    monomials: &[CompoundId],
) -> Vec<LinearRelation> {
    let alphabet = registry.alphabet();
    let mut seen: HashSet<(CompoundId, Vec<CompoundId>)> = HashSet::new();
    let mut out = Vec::new();

    for &m in monomials {
        let ranks = registry.ranks_of(m);
        for pos in 0..ranks.len() {
            let op = alphabet.operator(ranks[pos]).clone();
            if scenario.parties()[op.party as usize].has_children {
                continue;
            }
            let ortho = alphabet.ortho_group_of(&op).to_vec();
            if ortho.len() <= 1 {
                continue;
            }
            let mut context = ranks.clone();
            context.remove(pos);
            let context_id = registry.intern(&context);

            let mut sibling_ids: Vec<CompoundId> = ortho
                .iter()
                .map(|&sib| {
                    let mut seq = context.clone();
                    seq.push(sib);
                    registry.intern(&seq)
                })
                .collect();
            sibling_ids.sort_unstable();

            if !seen.insert((context_id, sibling_ids.clone())) {
                continue;
            }
            let mut terms: Vec<(CompoundId, f64)> =
                sibling_ids.into_iter().map(|id| (id, 1.0)).collect();
            terms.push((context_id, -1.0));
            if let Ok(rel) = LinearRelation::new(terms, RelOp::Le, 0.0) {
                out.push(rel);
            }
        }
    }
    out
}
