//! Valuation engine (component J, distilled §4.J).
//!
//! Classifies every interned compound against a distribution as
//! [`ValueState::FullyKnown`], [`ValueState::PartiallyKnown`] (LPI:
//! `compound = coeff * remaining`, `remaining` itself a freshly interned
//! compound of the still-unknown atoms), or [`ValueState::Free`]. Feeds
//! the constraint assembler's optional LPI rows, the moment-matrix
//! bounds, and the processed objective.

use std::collections::HashMap;

use itertools::Itertools;

use crate::operator::{OperatorAlphabet, Rank};
use crate::registry::{AtomicId, CompoundId, MonomialRegistry, ONE_ID};
use crate::scenario::{CausalScenario, Distribution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValuationError {
    #[error("objective references unknown compound id {0}")]
    UnknownCompound(CompoundId),
}

/// Where a compound's numeric value stands (distilled §4.J).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueState {
    /// No atomic factor has a known value.
    Free,
    /// `compound = coeff * x[remaining]`; `remaining` is the compound of
    /// just the still-unknown atomic factors (LPI, distilled §4.J
    /// "semiknown").
    PartiallyKnown { coeff: f64, remaining: CompoundId },
    /// Every atomic factor is known; `compound`'s value is fixed.
    FullyKnown(f64),
}

/// A numeric bound on a compound's variable (distilled §4.J "Bounds").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// `lower == upper`: the value is pinned exactly.
    Fixed(f64),
    /// A one-sided lower bound only, with no corresponding upper bound
    /// (the `supports_mode` relaxation of a known strictly-positive value).
    LowerOnly(f64),
}

impl Bound {
    pub fn lower(self) -> f64 {
        match self {
            Bound::Fixed(v) | Bound::LowerOnly(v) => v,
        }
    }

    pub fn upper(self) -> Option<f64> {
        match self {
            Bound::Fixed(v) => Some(v),
            Bound::LowerOnly(_) => None,
        }
    }
}

/// Computes a knowable atom's numeric value from `dist` under the
/// non-signalling assumption: parties the atom doesn't mention are summed
/// out at an arbitrarily fixed setting, since a non-signalling marginal
/// does not depend on that choice (distilled §3 "knowable").
fn knowable_value(
    operators: &[Rank],
    scenario: &CausalScenario,
    alphabet: &OperatorAlphabet,
    dist: &Distribution,
) -> f64 {
    let n_parties = scenario.n_parties();
    let mut outcome_fixed: Vec<Option<usize>> = vec![None; n_parties];
    let mut setting_fixed: Vec<usize> = vec![0; n_parties];
    for &r in operators {
        let op = alphabet.operator(r);
        outcome_fixed[op.party as usize] = Some(op.outcome as usize);
        setting_fixed[op.party as usize] = op.setting as usize;
    }
    let free_parties: Vec<usize> =
        (0..n_parties).filter(|&p| outcome_fixed[p].is_none()).collect();
    if free_parties.is_empty() {
        let outcomes: Vec<usize> = outcome_fixed.iter().map(|o| o.unwrap()).collect();
        return dist.get(&outcomes, &setting_fixed);
    }
    let ranges: Vec<Vec<usize>> = free_parties
        .iter()
        .map(|&p| (0..scenario.parties()[p].outcomes).collect())
        .collect();
    let mut total = 0.0;
    for combo in ranges.into_iter().multi_cartesian_product() {
        let mut outcomes = outcome_fixed.clone();
        for (i, &p) in free_parties.iter().enumerate() {
            outcomes[p] = Some(combo[i]);
        }
        let outcomes: Vec<usize> = outcomes.into_iter().map(|o| o.unwrap()).collect();
        total += dist.get(&outcomes, &setting_fixed);
    }
    total
}

/// Tracks known/semiknown/free state for every compound the caller has
/// asked it to classify.
#[derive(Debug, Default)]
pub struct ValuationEngine {
    atom_values: HashMap<AtomicId, f64>,
    compound_state: HashMap<CompoundId, ValueState>,
    /// When set, atomic knowability from the registry is ignored: only
    /// atoms present in the explicit value map passed to `set_values` are
    /// ever treated as known (distilled §4.J "only_specified_values").
    only_specified_values: bool,
}

impl ValuationEngine {
    pub fn new(only_specified_values: bool) -> Self {
        Self {
            atom_values: HashMap::new(),
            compound_state: HashMap::new(),
            only_specified_values,
        }
    }

    pub fn reset_values(&mut self) {
        self.atom_values.clear();
        self.compound_state.clear();
    }

    /// Classifies every compound in `compounds` against `dist` (optional:
    /// `None` is only meaningful together with a non-empty
    /// `explicit_atom_values`, the `only_specified_values` escape hatch)
    /// and `explicit_atom_values`, an override of individual atoms'
    /// numeric values that always takes precedence over distribution
    /// lookup. `registry` is mutable because semiknown compounds need
    /// their still-unknown remainder freshly interned.
    pub fn set_values(
        &mut self,
        dist: Option<&Distribution>,
        explicit_atom_values: &HashMap<AtomicId, f64>,
        registry: &mut MonomialRegistry,
        compounds: &[CompoundId],
    ) {
        self.reset_values();
        for atom in registry.atoms() {
            if let Some(&v) = explicit_atom_values.get(&atom.id) {
                self.atom_values.insert(atom.id, v);
                continue;
            }
            if self.only_specified_values {
                continue;
            }
            if atom.knowable {
                if let Some(dist) = dist {
                    let v = knowable_value(&atom.operators, registry.scenario(), registry.alphabet(), dist);
                    self.atom_values.insert(atom.id, v);
                }
            }
        }

        for &id in compounds {
            let state = if id == ONE_ID {
                ValueState::FullyKnown(1.0)
            } else {
                let Some(atoms) = registry.compound(id).map(|c| c.atoms.clone()) else {
                    continue;
                };
                self.classify(&atoms, registry)
            };
            self.compound_state.insert(id, state);
        }
    }

    fn classify(&self, atoms: &[AtomicId], registry: &mut MonomialRegistry) -> ValueState {
        let mut known_product = 1.0;
        let mut unknown_atoms: Vec<AtomicId> = Vec::new();
        for &a in atoms {
            match self.atom_values.get(&a) {
                Some(&v) => known_product *= v,
                None => unknown_atoms.push(a),
            }
        }
        if unknown_atoms.is_empty() {
            ValueState::FullyKnown(known_product)
        } else if unknown_atoms.len() == atoms.len() {
            ValueState::Free
        } else {
            let remaining = registry.intern_from_atoms(&mut unknown_atoms);
            ValueState::PartiallyKnown { coeff: known_product, remaining }
        }
    }

    pub fn state_of(&self, id: CompoundId) -> ValueState {
        self.compound_state.get(&id).copied().unwrap_or(ValueState::Free)
    }

    /// All `PartiallyKnown` splits, for the constraint assembler's
    /// optional LPI equalities.
    pub fn splits(&self) -> Vec<(CompoundId, f64, CompoundId)> {
        self.compound_state
            .iter()
            .filter_map(|(&id, &state)| match state {
                ValueState::PartiallyKnown { coeff, remaining } => Some((id, coeff, remaining)),
                _ => None,
            })
            .collect()
    }

    /// Bounds per fully-known compound. In `supports_mode`, a known
    /// strictly-positive value is no longer an equality at all: only
    /// whether the event is possible matters, not its exact probability, so
    /// the known moment is replaced by a one-sided `>= 1` positivity bound
    /// (distilled §4.J "supports-mode" replaces equalities by positivity).
    /// A known value of exactly `0` is unaffected by `supports_mode` and
    /// stays a fixed equality (the event cannot happen either way).
    pub fn bounds(&self, supports_mode: bool) -> HashMap<CompoundId, Bound> {
        let mut out = HashMap::new();
        for (&id, &state) in &self.compound_state {
            if let ValueState::FullyKnown(v) = state {
                let bound = if supports_mode && v > 0.0 {
                    Bound::LowerOnly(1.0)
                } else {
                    Bound::Fixed(v)
                };
                out.insert(id, bound);
            }
        }
        out
    }

    /// Rewrites a linear objective by folding fully-known terms into a
    /// constant and rescaling semiknown terms onto their remaining
    /// unknown compound (distilled §4.J "processed objective").
    pub fn processed_objective(&self, objective: &[(CompoundId, f64)]) -> (Vec<(CompoundId, f64)>, f64) {
        let mut terms: HashMap<CompoundId, f64> = HashMap::new();
        let mut constant = 0.0;
        for &(id, coeff) in objective {
            match self.state_of(id) {
                ValueState::FullyKnown(v) => constant += coeff * v,
                ValueState::PartiallyKnown { coeff: c, remaining } => {
                    *terms.entry(remaining).or_insert(0.0) += coeff * c;
                }
                ValueState::Free => {
                    *terms.entry(id).or_insert(0.0) += coeff;
                }
            }
        }
        (terms.into_iter().collect(), constant)
    }
}
