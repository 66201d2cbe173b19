//! Commutation oracle (component B, distilled §4.B).
//!
//! Precomputes the `L x L` non-commuting matrix `NC[i,j]` once per
//! scenario. Quadratic in `L` by construction; this is the one place in
//! the crate where an `O(L^2)` pass is expected and acceptable (distilled
//! §4.B: "done once").

use fixedbitset::FixedBitSet;

use crate::operator::{OperatorAlphabet, Rank};
use crate::scenario::CausalScenario;

/// The commutation oracle: `NC[i][j]` is set iff ranks `i` and `j` do
/// *not* commute. Symmetric, zero diagonal (distilled §4.B).
#[derive(Debug)]
pub struct CommutationOracle {
    commuting_model: bool,
    rows: Vec<FixedBitSet>,
}

impl CommutationOracle {
    pub fn build(scenario: &CausalScenario, alphabet: &OperatorAlphabet, commuting_model: bool) -> Self {
        let l = alphabet.len();
        let mut rows = vec![FixedBitSet::with_capacity(l); l];
        if !commuting_model {
            for i in 0..l {
                let a = alphabet.operator(Rank(i as u32));
                for j in (i + 1)..l {
                    let b = alphabet.operator(Rank(j as u32));
                    if !Self::commutes_pairwise(scenario, a, b) {
                        rows[i].insert(j);
                        rows[j].insert(i);
                    }
                }
            }
        }
        Self { commuting_model, rows }
    }

    fn commutes_pairwise(
        scenario: &CausalScenario,
        a: &crate::operator::Operator,
        b: &crate::operator::Operator,
    ) -> bool {
        if a.party != b.party {
            return true;
        }
        for s in 0..scenario.n_sources() {
            if scenario.feeds(s, a.party as usize) && a.copies[s] != b.copies[s] {
                return true;
            }
        }
        false
    }

    /// Whether ranks `i` and `j` commute.
    pub fn commutes(&self, i: Rank, j: Rank) -> bool {
        if self.commuting_model {
            return true;
        }
        !self.rows[i.as_usize()].contains(j.as_usize())
    }

    pub fn commuting_model(&self) -> bool {
        self.commuting_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::OperatorAlphabet;
    use crate::scenario::{Party, Source};

    fn scenario() -> CausalScenario {
        CausalScenario::new(
            vec![
                Party { name: "A".into(), outcomes: 2, settings: 2, has_children: false },
                Party { name: "B".into(), outcomes: 2, settings: 2, has_children: false },
            ],
            vec![Source { name: "lambda".into(), inflation_level: 2 }],
            vec![vec![true, true]],
            true,
        )
        .unwrap()
    }

    #[test]
    fn diagonal_is_zero() {
        let scenario = scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let nc = CommutationOracle::build(&scenario, &alphabet, false);
        for i in 0..alphabet.len() {
            assert!(nc.commutes(Rank(i as u32), Rank(i as u32)));
        }
    }

    #[test]
    fn different_parties_always_commute() {
        let scenario = scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let nc = CommutationOracle::build(&scenario, &alphabet, false);
        for i in alphabet.by_party(0) {
            for j in alphabet.by_party(1) {
                assert!(nc.commutes(*i, *j));
            }
        }
    }

    #[test]
    fn commuting_model_commutes_everything() {
        let scenario = scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let nc = CommutationOracle::build(&scenario, &alphabet, true);
        for i in 0..alphabet.len() {
            for j in 0..alphabet.len() {
                assert!(nc.commutes(Rank(i as u32), Rank(j as u32)));
            }
        }
    }

    #[test]
    fn different_copies_commute_same_party() {
        let scenario = scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let nc = CommutationOracle::build(&scenario, &alphabet, false);
        let party0 = alphabet.by_party(0);
        let a = alphabet.operator(party0[0]);
        let different_copy = party0.iter().find(|&&r| {
            let op = alphabet.operator(r);
            op.copies != a.copies
        });
        if let Some(&r) = different_copy {
            assert!(nc.commutes(party0[0], r));
        }
    }
}
