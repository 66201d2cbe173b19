//! Canonicalizer (component C, distilled §4.C).
//!
//! Rewrites an arbitrary sequence of operator ranks to a unique normal
//! form modulo orthogonality, idempotence, and commutation, or to the
//! distinguished value "zero". Two representations are produced depending
//! on the scenario's commutation model:
//!
//! - **Commuting model**: canonicalization is "sort, dedupe adjacent,
//!   annihilate on outcome conflict" (distilled §4.C), so the normal form
//!   is exactly a [`FixedBitSet`] over ranks.
//! - **Non-commuting model**: the three local rewrite rules are applied to
//!   a fixed point on an ordered sequence; termination follows because the
//!   lexicographic tuple of ranks strictly decreases on any swap and is
//!   bounded below, idempotence strictly shortens the sequence, and
//!   orthogonality terminates immediately (distilled §4.C).

use fixedbitset::FixedBitSet;

use crate::commutation::CommutationOracle;
use crate::operator::{Operator, OperatorAlphabet, Rank};

/// A canonical monomial: either the distinguished zero, or a well-formed
/// normal form in one of the two representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canonical {
    Zero,
    /// Commuting-model normal form: the set of operators present.
    Commuting(FixedBitSet),
    /// Non-commuting-model normal form: the ordered sequence of operators
    /// after sort/annihilate has reached a fixed point.
    Ordered(Vec<Rank>),
}

impl Canonical {
    pub fn is_zero(&self) -> bool {
        matches!(self, Canonical::Zero)
    }

    /// The ranks present, regardless of representation, sorted ascending.
    /// `Zero` has no ranks.
    pub fn ranks(&self) -> Vec<Rank> {
        match self {
            Canonical::Zero => Vec::new(),
            Canonical::Commuting(bits) => bits.ones().map(|i| Rank(i as u32)).collect(),
            Canonical::Ordered(v) => v.clone(),
        }
    }
}

fn ortho_conflict(a: &Operator, b: &Operator) -> bool {
    a.party == b.party && a.copies == b.copies && a.setting == b.setting && a.outcome != b.outcome
}

/// Canonicalizes `ranks` under the commuting model (distilled §4.C): sort,
/// dedupe adjacent equals, and annihilate to zero on any outcome conflict
/// within the same orthogonal group.
pub fn canonicalize_commuting(ranks: &[Rank], alphabet: &OperatorAlphabet) -> Canonical {
    let mut bits = FixedBitSet::with_capacity(alphabet.len());
    for &r in ranks {
        bits.insert(r.as_usize());
    }
    // Orthogonality: any two *distinct* set ranks sharing an ortho group
    // (same party/copies/setting, different outcome) annihilate the whole
    // monomial, since under commutativity they are adjacent after sorting.
    for i in bits.ones() {
        let a = alphabet.operator(Rank(i as u32));
        for j in alphabet.ortho_group_of(a) {
            if j.as_usize() != i && bits.contains(j.as_usize()) {
                return Canonical::Zero;
            }
        }
    }
    Canonical::Commuting(bits)
}

/// Canonicalizes `ranks` under the non-commuting model (distilled §4.C):
/// repeatedly apply orthogonality, idempotence, and commutation-sort to a
/// fixed point via adjacent-pair bubbling.
pub fn canonicalize_ordered(
    ranks: &[Rank],
    alphabet: &OperatorAlphabet,
    nc: &CommutationOracle,
) -> Canonical {
    let mut seq: Vec<Rank> = ranks.to_vec();
    loop {
        let mut changed = false;
        let mut i = 0;
        while i + 1 < seq.len() {
            let a = alphabet.operator(seq[i]);
            let b = alphabet.operator(seq[i + 1]);
            if seq[i] == seq[i + 1] {
                // Idempotence: collapse adjacent duplicates.
                seq.remove(i + 1);
                changed = true;
                continue;
            }
            if ortho_conflict(a, b) {
                return Canonical::Zero;
            }
            if nc.commutes(seq[i], seq[i + 1]) && seq[i] > seq[i + 1] {
                seq.swap(i, i + 1);
                changed = true;
                continue;
            }
            i += 1;
        }
        if !changed {
            break;
        }
    }
    Canonical::Ordered(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{CausalScenario, Party, Source};

    fn scenario() -> CausalScenario {
        CausalScenario::new(
            vec![Party {
                name: "A".into(),
                outcomes: 2,
                settings: 2,
                has_children: false,
            }],
            vec![],
            vec![],
            true,
        )
        .unwrap()
    }

    #[test]
    fn idempotent_commuting() {
        let scenario = scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let r = alphabet.by_party(0)[0];
        let once = canonicalize_commuting(&[r, r], &alphabet);
        let twice_ranks = once.ranks();
        let twice = canonicalize_commuting(&twice_ranks, &alphabet);
        assert_eq!(once, twice);
    }

    #[test]
    fn outcome_conflict_is_zero() {
        let scenario = scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        // Two operators at party 0, setting 0, distinct outcomes (0 and 1
        // are the only outcomes for a binary party; only outcome 0 is
        // explicit under CG, so use setting difference instead: build two
        // explicit operators sharing everything but outcome by hand when
        // outcomes >= 3. With a binary party there's only one explicit
        // outcome, so this test uses a ternary party instead.
        let scenario3 = CausalScenario::new(
            vec![Party {
                name: "A".into(),
                outcomes: 3,
                settings: 1,
                has_children: false,
            }],
            vec![],
            vec![],
            true,
        )
        .unwrap();
        let alphabet3 = OperatorAlphabet::build(&scenario3);
        let ranks = alphabet3.by_party(0);
        assert_eq!(ranks.len(), 2);
        let canon = canonicalize_commuting(&[ranks[0], ranks[1]], &alphabet3);
        assert!(canon.is_zero());
        let _ = alphabet; // keep binary alphabet constructed, used for shape only
    }

    #[test]
    fn ordered_sorts_commuting_pairs() {
        let scenario = CausalScenario::new(
            vec![
                Party { name: "A".into(), outcomes: 2, settings: 1, has_children: false },
                Party { name: "B".into(), outcomes: 2, settings: 1, has_children: false },
            ],
            vec![],
            vec![],
            true,
        )
        .unwrap();
        let alphabet = OperatorAlphabet::build(&scenario);
        let nc = CommutationOracle::build(&scenario, &alphabet, false);
        let a = alphabet.by_party(0)[0];
        let b = alphabet.by_party(1)[0];
        let out_of_order = canonicalize_ordered(&[b, a], &alphabet, &nc);
        match out_of_order {
            Canonical::Ordered(seq) => assert_eq!(seq, vec![a, b]),
            _ => panic!("expected ordered normal form"),
        }
    }
}
