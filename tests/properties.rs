//! Property-based tests for the monomial engine's core invariants.
//!
//! Each property below is checked against randomly generated operator-rank
//! sequences over a small, fixed bilocal-inflation scenario (2 sources,
//! inflation level 2 each, 3 parties) — large enough to exercise
//! factorization and the symmetry group, small enough to keep the
//! generated alphabet (and so the property's search space) bounded.

use proptest::prelude::*;

use inflation_relax::canon::{canonicalize_commuting, canonicalize_ordered};
use inflation_relax::commutation::CommutationOracle;
use inflation_relax::factor::factorize;
use inflation_relax::operator::{OperatorAlphabet, Rank};
use inflation_relax::registry::{MonomialRegistry, ONE_ID};
use inflation_relax::scenario::{CausalScenario, Party, Source};
use inflation_relax::symmetry::SymmetryGroup;

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

fn rank_seq(alphabet_len: usize, max_len: usize) -> impl Strategy<Value = Vec<Rank>> {
    prop::collection::vec(0..alphabet_len as u32, 0..=max_len)
        .prop_map(|v| v.into_iter().map(Rank).collect())
}

proptest! {
    /// P1: commuting-model canonicalization is idempotent.
    #[test]
    fn canonicalize_commuting_is_idempotent(ranks in rank_seq(8, 6)) {
        let scenario = bilocal_scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let ranks: Vec<Rank> = ranks.into_iter().map(|r| Rank(r.0 % alphabet.len() as u32)).collect();
        let once = canonicalize_commuting(&ranks, &alphabet);
        let twice = canonicalize_commuting(&once.ranks(), &alphabet);
        prop_assert_eq!(once, twice);
    }

    /// P2: non-commuting canonicalization is idempotent.
    #[test]
    fn canonicalize_ordered_is_idempotent(ranks in rank_seq(8, 6)) {
        let scenario = bilocal_scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let nc = CommutationOracle::build(&scenario, &alphabet, false);
        let ranks: Vec<Rank> = ranks.into_iter().map(|r| Rank(r.0 % alphabet.len() as u32)).collect();
        let once = canonicalize_ordered(&ranks, &alphabet, &nc);
        let twice = canonicalize_ordered(&once.ranks(), &alphabet, &nc);
        prop_assert_eq!(once, twice);
    }

    /// P3: factorization partitions a canonical monomial's operators —
    /// every rank appears in exactly one factor, and factors are disjoint.
    #[test]
    fn factorization_partitions_the_monomial(ranks in rank_seq(8, 6)) {
        let scenario = bilocal_scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let canon = canonicalize_commuting(&ranks, &alphabet);
        if canon.is_zero() {
            return Ok(());
        }
        let factors = factorize(&canon, &alphabet);
        let mut all: Vec<Rank> = factors.iter().flatten().copied().collect();
        all.sort();
        let mut expected = canon.ranks();
        expected.sort();
        prop_assert_eq!(all, expected);
    }

    /// P4: interning is invariant under reordering the input rank sequence
    /// (the canonicalizer/factorizer/registry pipeline is order-blind).
    #[test]
    fn intern_is_order_invariant(ranks in rank_seq(8, 6), seed in 0u64..1000) {
        let scenario = bilocal_scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let nc = CommutationOracle::build(&scenario, &alphabet, true);
        let symmetry = SymmetryGroup::build(&scenario, &alphabet);
        let mut reg = MonomialRegistry::new(&scenario, &alphabet, &nc, &symmetry);

        let mut shuffled = ranks.clone();
        // Deterministic pseudo-shuffle from `seed`, avoiding any RNG crate.
        for i in (1..shuffled.len()).rev() {
            let j = (seed as usize + i * 2654435761) % (i + 1);
            shuffled.swap(i, j);
        }

        let a = reg.intern(&ranks);
        let b = reg.intern(&shuffled);
        prop_assert_eq!(a, b);
    }

    /// P5: the unit always interns to `ONE_ID` regardless of scenario.
    #[test]
    fn empty_sequence_is_always_the_unit(_seed in 0u32..10) {
        let scenario = bilocal_scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let nc = CommutationOracle::build(&scenario, &alphabet, true);
        let symmetry = SymmetryGroup::build(&scenario, &alphabet);
        let mut reg = MonomialRegistry::new(&scenario, &alphabet, &nc, &symmetry);
        prop_assert_eq!(reg.intern(&[]), ONE_ID);
    }

    /// P6: every symmetry generator is an involution on ranks.
    #[test]
    fn symmetry_generators_are_involutions(rank in 0u32..8) {
        let scenario = bilocal_scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let symmetry = SymmetryGroup::build(&scenario, &alphabet);
        let r = Rank(rank % alphabet.len() as u32);
        for g in symmetry.generators() {
            let once = g.apply_rank(r);
            let twice = g.apply_rank(once);
            prop_assert_eq!(twice, r);
        }
    }

    /// P7: the orbit representative of a bitset is a fixed point of the
    /// representative-selection map itself.
    #[test]
    fn orbit_representative_is_a_fixed_point(ranks in rank_seq(8, 6)) {
        let scenario = bilocal_scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let symmetry = SymmetryGroup::build(&scenario, &alphabet);
        let mut bits = fixedbitset::FixedBitSet::with_capacity(alphabet.len());
        for r in &ranks {
            bits.insert(Rank(r.0 % alphabet.len() as u32).as_usize());
        }
        let rep = symmetry.orbit_representative_bitset(&bits);
        let rep_again = symmetry.orbit_representative_bitset(&rep);
        prop_assert_eq!(rep.as_slice().to_vec(), rep_again.as_slice().to_vec());
    }

    /// P8: canonicalizing an already-canonical commuting monomial never
    /// reports a larger operator count than the input.
    #[test]
    fn canonicalization_never_grows_the_operator_count(ranks in rank_seq(8, 6)) {
        let scenario = bilocal_scenario();
        let alphabet = OperatorAlphabet::build(&scenario);
        let canon = canonicalize_commuting(&ranks, &alphabet);
        prop_assert!(canon.ranks().len() <= ranks.len());
    }
}
