//! Symmetry group (component E, distilled §4.E).
//!
//! `G` is the direct product, over sources, of the symmetric group on
//! that source's copies. A generating set of `sum_s (k_s - 1)` adjacent
//! transpositions suffices; the registry and moment-matrix builder close
//! over it (by BFS) to compute full-orbit representatives.

use fixedbitset::FixedBitSet;
use std::collections::HashSet;

use crate::operator::{Operator, OperatorAlphabet, Rank};
use crate::scenario::CausalScenario;

/// One adjacent transposition `(source, i, i+1)` swapping copies `i` and
/// `i+1` of `source`, fixing every operator that does not consume it.
#[derive(Debug, Clone)]
pub struct Generator {
    /// Precomputed `Rank -> Rank` permutation induced on the whole alphabet.
    perm: Vec<Rank>,
}

impl Generator {
    fn build(source: usize, i: u16, j: u16, alphabet: &OperatorAlphabet) -> Self {
        let mut perm = Vec::with_capacity(alphabet.len());
        for r in 0..alphabet.len() {
            let op = alphabet.operator(Rank(r as u32));
            let mut swapped = op.clone();
            if op.copies[source] == i {
                swapped.copies[source] = j;
            } else if op.copies[source] == j {
                swapped.copies[source] = i;
            }
            let new_rank = if swapped == *op {
                Rank(r as u32)
            } else {
                alphabet
                    .rank(&swapped)
                    .expect("source-copy relabeling stays within the alphabet")
            };
            perm.push(new_rank);
        }
        Self { perm }
    }

    /// Applies this generator to a single operator rank, `O(1)`.
    pub fn apply_rank(&self, r: Rank) -> Rank {
        self.perm[r.as_usize()]
    }

    /// Applies this generator to a commuting-model bitset, `O(L)`
    /// (distilled §4.E item (c)).
    pub fn apply_bitset(&self, bits: &FixedBitSet) -> FixedBitSet {
        let mut out = FixedBitSet::with_capacity(bits.len());
        for i in bits.ones() {
            out.insert(self.apply_rank(Rank(i as u32)).as_usize());
        }
        out
    }

    pub fn apply_ordered(&self, seq: &[Rank]) -> Vec<Rank> {
        seq.iter().map(|&r| self.apply_rank(r)).collect()
    }

    fn apply_operator(&self, alphabet: &OperatorAlphabet, op: &Operator) -> Operator {
        let r = alphabet.rank(op).expect("operator must be in the alphabet");
        alphabet.operator(self.apply_rank(r)).clone()
    }
}

/// The source-permutation symmetry group, represented by its generating
/// set of adjacent transpositions (distilled §4.E).
#[derive(Debug)]
pub struct SymmetryGroup {
    generators: Vec<Generator>,
}

impl SymmetryGroup {
    pub fn build(scenario: &CausalScenario, alphabet: &OperatorAlphabet) -> Self {
        let mut generators = Vec::new();
        for s in 0..scenario.n_sources() {
            let k = scenario.inflation_level(s) as u16;
            for i in 1..k {
                generators.push(Generator::build(s, i, i + 1, alphabet));
            }
        }
        Self { generators }
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn is_trivial(&self) -> bool {
        self.generators.is_empty()
    }

    /// The lex-minimum bitset in the orbit of `bits` under the full group
    /// `G` (distilled §4.E "Representative choice"), computed by BFS
    /// closure over the generating set.
    pub fn orbit_representative_bitset(&self, bits: &FixedBitSet) -> FixedBitSet {
        if self.generators.is_empty() {
            return bits.clone();
        }
        let mut seen: HashSet<Vec<u32>> = HashSet::new();
        let key = |b: &FixedBitSet| -> Vec<u32> { b.as_slice().to_vec() };
        let mut best = bits.clone();
        seen.insert(key(bits));
        let mut frontier = vec![bits.clone()];
        while let Some(cur) = frontier.pop() {
            for g in &self.generators {
                let next = g.apply_bitset(&cur);
                if seen.insert(key(&next)) {
                    if lex_less_bitset(&next, &best) {
                        best = next.clone();
                    }
                    frontier.push(next);
                }
            }
        }
        best
    }

    /// The lex-minimum ordered sequence in the orbit of `seq` under `G`.
    pub fn orbit_representative_ordered(
        &self,
        seq: &[Rank],
        canon: impl Fn(&[Rank]) -> Vec<Rank>,
    ) -> Vec<Rank> {
        if self.generators.is_empty() {
            return canon(seq);
        }
        let start = canon(seq);
        let mut seen: HashSet<Vec<Rank>> = HashSet::new();
        let mut best = start.clone();
        seen.insert(start.clone());
        let mut frontier = vec![start];
        while let Some(cur) = frontier.pop() {
            for g in &self.generators {
                let next = canon(&g.apply_ordered(&cur));
                if seen.insert(next.clone()) {
                    if next < best {
                        best = next.clone();
                    }
                    frontier.push(next);
                }
            }
        }
        best
    }

    /// Induces the permutation of `columns` (by their canonical bitset
    /// identity) under every generator, used by the moment-matrix builder
    /// (distilled §4.H step 2). Returns, per generator, a map from column
    /// index to the index of its image in `columns`, or `None` if the
    /// image is not present (the generating set is not closed under `G`).
    pub fn induced_column_permutations(
        &self,
        columns: &[FixedBitSet],
    ) -> Vec<Vec<Option<usize>>> {
        let index_of: std::collections::HashMap<Vec<u32>, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_slice().to_vec(), i))
            .collect();
        self.generators
            .iter()
            .map(|g| {
                columns
                    .iter()
                    .map(|c| {
                        let img = g.apply_bitset(c);
                        index_of.get(&img.as_slice().to_vec()).copied()
                    })
                    .collect()
            })
            .collect()
    }

    pub fn apply_operator(&self, generator_idx: usize, alphabet: &OperatorAlphabet, op: &Operator) -> Operator {
        self.generators[generator_idx].apply_operator(alphabet, op)
    }
}

fn lex_less_bitset(a: &FixedBitSet, b: &FixedBitSet) -> bool {
    a.as_slice() < b.as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Party, Source};

    fn bilocal_scenario() -> CausalScenario {
        CausalScenario::new(
            vec![
                Party { name: "A".into(), outcomes: 2, settings: 1, has_children: false },
                Party { name: "B".into(), outcomes: 2, settings: 1, has_children: false },
                Party { name: "C".into(), outcomes: 2, settings: 1, has_children: false },
            ],
            vec![
                Source { name: "s1".into(), inflation_level: 2 },
                Source { name: "s2".into(), inflation_level: 2 },
            ],
            vec![vec![true, true, false], vec![false, true, true]],
            true,
        )
        .unwrap()
    }

    #[test]
    fn generator_count_matches_sum_ks_minus_one() {
        let scenario = bilocal_scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let group = SymmetryGroup::build(&scenario, &alphabet);
        // k_s - 1 = 1 per source, 2 sources => 2 generators.
        assert_eq!(group.generators().len(), 2);
    }

    #[test]
    fn generator_is_an_involution_on_ranks() {
        let scenario = bilocal_scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let group = SymmetryGroup::build(&scenario, &alphabet);
        let g = &group.generators()[0];
        for r in 0..alphabet.len() {
            let once = g.apply_rank(Rank(r as u32));
            let twice = g.apply_rank(once);
            assert_eq!(twice, Rank(r as u32));
        }
    }
}
