//! Operator alphabet (component A, distilled §4.A).
//!
//! An [`Operator`] is the fixed-width tuple `(party, copy_1..copy_Ns,
//! setting, outcome)` of distilled §3. The [`OperatorAlphabet`] enumerates
//! every legal tuple once, orders them by the default lexicographic order,
//! and assigns each a dense [`Rank`] — the only thing the rest of the
//! engine operates on downstream of this module.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::scenario::CausalScenario;

/// Index of an operator within the alphabet, `0..L-1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rank(pub u32);

impl Rank {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A single inflation copy index. `0` means "source does not feed this
/// party" (distilled §3); otherwise `1..=k_s`.
pub type CopyIdx = u16;

/// A fixed-width operator tuple `(party, copy_1..copy_Ns, setting, outcome)`.
///
/// `Ord`/`PartialOrd` are derived field-order, which *is* the default
/// lexicographic order distilled §4.A asks for: party major, then copy
/// indices, then setting, then outcome.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Operator {
    pub party: u16,
    pub copies: SmallVec<[CopyIdx; 4]>,
    pub setting: u16,
    pub outcome: u16,
}

impl Operator {
    pub fn touches_source(&self, source: usize) -> bool {
        self.copies[source] != 0
    }

    /// The key identifying this operator's orthogonal group: everything
    /// except the outcome (distilled §4.A item (d)).
    fn ortho_key(&self) -> (u16, SmallVec<[CopyIdx; 4]>, u16) {
        (self.party, self.copies.clone(), self.setting)
    }
}

/// The finite, precomputed set of all legal operators for a scenario
/// (distilled §4.A).
#[derive(Debug)]
pub struct OperatorAlphabet {
    ops: Vec<Operator>,
    rank_of: HashMap<Operator, Rank>,
    by_party: Vec<Vec<Rank>>,
    /// Per party, groups of ranks sharing all coordinates except outcome.
    ortho_groups: Vec<Vec<Vec<Rank>>>,
    n_sources: usize,
}

impl OperatorAlphabet {
    /// Enumerates the full alphabet for `scenario`. Outcomes use the
    /// Collins–Gisin convention for childless parties (distilled §3): the
    /// last outcome `o_p - 1` is never materialized as an operator for
    /// them. Parties with children keep every outcome `0..o_p`, since their
    /// normalization constraint is an exact equality over the whole ortho
    /// group rather than a CG fold (distilled §4.I).
    pub fn build(scenario: &CausalScenario) -> Self {
        let n_sources = scenario.n_sources();
        let mut ops: Vec<Operator> = Vec::new();

        for (p, party) in scenario.parties().iter().enumerate() {
            let copy_ranges: Vec<Vec<CopyIdx>> = (0..n_sources)
                .map(|s| {
                    if scenario.feeds(s, p) {
                        (1..=scenario.inflation_level(s) as CopyIdx).collect()
                    } else {
                        vec![0]
                    }
                })
                .collect();

            let copy_tuples: Vec<SmallVec<[CopyIdx; 4]>> = if copy_ranges.is_empty() {
                vec![SmallVec::new()]
            } else {
                copy_ranges
                    .into_iter()
                    .multi_cartesian_product()
                    .map(SmallVec::from_vec)
                    .collect()
            };

            // Collins-Gisin truncation only applies to childless (leaf)
            // parties: {0, ..., o_p - 2}. A party with children keeps every
            // outcome, {0, ..., o_p - 1}, since its normalization equality
            // needs the full ortho group to balance (distilled §4.I).
            let explicit_outcomes = if party.has_children {
                party.outcomes
            } else {
                party.outcomes.saturating_sub(1)
            };

            for copies in &copy_tuples {
                for setting in 0..party.settings {
                    for outcome in 0..explicit_outcomes {
                        ops.push(Operator {
                            party: p as u16,
                            copies: copies.clone(),
                            setting: setting as u16,
                            outcome: outcome as u16,
                        });
                    }
                }
            }
        }

        // Default lex order: party major, then copies, then setting, then
        // outcome -- exactly `Operator`'s derived `Ord`.
        ops.sort();

        let mut rank_of = HashMap::with_capacity(ops.len());
        for (i, op) in ops.iter().enumerate() {
            rank_of.insert(op.clone(), Rank(i as u32));
        }

        let mut by_party: Vec<Vec<Rank>> = vec![Vec::new(); scenario.n_parties()];
        for (i, op) in ops.iter().enumerate() {
            by_party[op.party as usize].push(Rank(i as u32));
        }

        let mut ortho_groups: Vec<Vec<Vec<Rank>>> = vec![Vec::new(); scenario.n_parties()];
        for p in 0..scenario.n_parties() {
            let mut groups: HashMap<(u16, SmallVec<[CopyIdx; 4]>, u16), Vec<Rank>> =
                HashMap::new();
            for &r in &by_party[p] {
                let op = &ops[r.as_usize()];
                groups.entry(op.ortho_key()).or_default().push(r);
            }
            let mut groups: Vec<Vec<Rank>> = groups.into_values().collect();
            groups.sort_by_key(|g| g[0]);
            ortho_groups[p] = groups;
        }

        Self {
            ops,
            rank_of,
            by_party,
            ortho_groups,
            n_sources,
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn n_sources(&self) -> usize {
        self.n_sources
    }

    pub fn alphabet(&self) -> &[Operator] {
        &self.ops
    }

    pub fn operator(&self, rank: Rank) -> &Operator {
        &self.ops[rank.as_usize()]
    }

    pub fn rank(&self, op: &Operator) -> Option<Rank> {
        self.rank_of.get(op).copied()
    }

    pub fn by_party(&self, party: usize) -> &[Rank] {
        &self.by_party[party]
    }

    pub fn ortho_groups(&self, party: usize) -> &[Vec<Rank>] {
        &self.ortho_groups[party]
    }

    /// The group of ranks sharing every coordinate of `op` except the
    /// outcome (distilled §4.A item (d)), including `op` itself.
    pub fn ortho_group_of(&self, op: &Operator) -> &[Rank] {
        self.ortho_groups[op.party as usize]
            .iter()
            .find(|g| self.ops[g[0].as_usize()].ortho_key() == op.ortho_key())
            .expect("every interned operator belongs to exactly one ortho group")
    }
}
