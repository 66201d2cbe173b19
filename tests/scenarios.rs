//! End-to-end tests against the five named causal structures: CHSH,
//! GHZ-cut inflation, bilocal, an identity-resolving column spec, and an
//! LPI-triangle semiknown check. None of these invoke an external LP/SDP
//! solver (out of scope for this crate, distilled §1 "Non-goals"); they
//! check the relaxation's *structure* is built correctly.

use std::collections::HashMap;

use inflation_relax::commutation::CommutationOracle;
use inflation_relax::generator::ColumnSpec;
use inflation_relax::operator::OperatorAlphabet;
use inflation_relax::program::InflationProgram;
use inflation_relax::scenario::{CausalScenario, Distribution, Party, Source};
use inflation_relax::symmetry::SymmetryGroup;
use inflation_relax::valuation::ValueState;

fn build_program<'s>(
    scenario: &'s CausalScenario,
    alphabet: &'s OperatorAlphabet,
    nc: &'s CommutationOracle,
    symmetry: &'s SymmetryGroup,
    spec: &ColumnSpec,
    sdp: bool,
) -> InflationProgram<'s> {
    InflationProgram::build(scenario, alphabet, nc, symmetry, spec, sdp, false).unwrap()
}

#[test]
fn chsh_npa1_moment_matrix_is_well_formed() {
    let scenario = CausalScenario::new(
        vec![
            Party { name: "A".into(), outcomes: 2, settings: 2, has_children: false },
            Party { name: "B".into(), outcomes: 2, settings: 2, has_children: false },
        ],
        vec![Source { name: "lambda".into(), inflation_level: 1 }],
        vec![vec![true, true]],
        true,
    )
    .unwrap();
    let alphabet = OperatorAlphabet::build(&scenario);
    let nc = CommutationOracle::build(&scenario, &alphabet, true);
    let symmetry = SymmetryGroup::build(&scenario, &alphabet);
    let spec = ColumnSpec::parse("npa1").unwrap();
    let program = build_program(&scenario, &alphabet, &nc, &symmetry, &spec, true);

    // unit + 4 single-party operators (2 settings x 2 parties).
    assert_eq!(program.generators().len(), 5);
    let mm = program.moment_matrix().unwrap();
    assert_eq!(mm.size, 5);
    assert_eq!(mm.get(0, 0), inflation_relax::registry::ONE_ID);
    for i in 0..mm.size {
        for j in 0..mm.size {
            assert_eq!(mm.get(i, j), mm.get(j, i), "Gamma must be symmetric in the commuting model");
        }
    }
}

#[test]
fn ghz_cut_inflation_scenario_builds_without_error() {
    // Three parties sharing a single common cause, inflated to level 2
    // (the minimal "cut inflation" used to detect GHZ incompatibility with
    // a fully bilocal-independent explanation).
    let scenario = CausalScenario::new(
        vec![
            Party { name: "A".into(), outcomes: 2, settings: 1, has_children: false },
            Party { name: "B".into(), outcomes: 2, settings: 1, has_children: false },
            Party { name: "C".into(), outcomes: 2, settings: 1, has_children: false },
        ],
        vec![Source { name: "lambda".into(), inflation_level: 2 }],
        vec![vec![true, true, true]],
        true,
    )
    .unwrap();
    let alphabet = OperatorAlphabet::build(&scenario);
    let nc = CommutationOracle::build(&scenario, &alphabet, true);
    let symmetry = SymmetryGroup::build(&scenario, &alphabet);
    let spec = ColumnSpec::parse("npa1").unwrap();
    let program = build_program(&scenario, &alphabet, &nc, &symmetry, &spec, true);

    // 2 copies x 3 parties + unit.
    assert_eq!(program.generators().len(), 1 + 3 * 2);
    assert!(program.moment_matrix().is_some());
    // k_s - 1 = 1 generator for the single inflated source.
    assert_eq!(program.symmetry().generators().len(), 1);
}

#[test]
fn bilocal_npa1_structural_properties() {
    let scenario = CausalScenario::new(
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
    .unwrap();
    let alphabet = OperatorAlphabet::build(&scenario);
    let nc = CommutationOracle::build(&scenario, &alphabet, true);
    let symmetry = SymmetryGroup::build(&scenario, &alphabet);
    let spec = ColumnSpec::parse("npa1").unwrap();
    let program = build_program(&scenario, &alphabet, &nc, &symmetry, &spec, true);

    assert_eq!(program.symmetry().generators().len(), 2);
    let mm = program.moment_matrix().unwrap();
    assert_eq!(mm.size, program.generators().len());
    // A and C never share a source, so their product must always factor
    // into two atoms and therefore never collapses to zero or a single
    // atomic monomial under canonicalization.
    let a = alphabet.by_party(0)[0];
    let c = alphabet.by_party(2)[0];
    let canon = inflation_relax::canon::canonicalize_commuting(&[a, c], &alphabet);
    assert!(!canon.is_zero());
}

#[test]
fn identity_handling_column_spec_yields_three_generators() {
    let scenario = CausalScenario::new(
        vec![Party { name: "A".into(), outcomes: 2, settings: 2, has_children: false }],
        vec![Source { name: "lambda".into(), inflation_level: 1 }],
        vec![vec![true]],
        true,
    )
    .unwrap();
    let alphabet = OperatorAlphabet::build(&scenario);
    let nc = CommutationOracle::build(&scenario, &alphabet, true);
    let symmetry = SymmetryGroup::build(&scenario, &alphabet);
    let spec = ColumnSpec::PartyBlocks(vec![vec![], vec![0, 0]]);
    let program = build_program(&scenario, &alphabet, &nc, &symmetry, &spec, true);

    assert_eq!(program.generators().len(), 3);
    let mm = program.moment_matrix().unwrap();
    // Row/column 0 is the unit: Gamma[0][j] == generators[j] exactly.
    for (j, &g) in program.generators().iter().enumerate() {
        assert_eq!(mm.get(0, j), g);
    }
}

#[test]
fn lpi_triangle_semiknown_coefficients_lie_in_unit_interval() {
    // A,B,C each pairwise share one latent source (no source touches all
    // three): the structure the LPI (linearized partial information)
    // constraint is named for, since some inflation-level-2 products
    // connect all three parties through a chain while still disagreeing
    // on a shared copy index, and so are never fully knowable.
    let scenario = CausalScenario::new(
        vec![
            Party { name: "A".into(), outcomes: 2, settings: 1, has_children: false },
            Party { name: "B".into(), outcomes: 2, settings: 1, has_children: false },
            Party { name: "C".into(), outcomes: 2, settings: 1, has_children: false },
        ],
        vec![
            Source { name: "s_ab".into(), inflation_level: 2 },
            Source { name: "s_bc".into(), inflation_level: 2 },
            Source { name: "s_ca".into(), inflation_level: 2 },
        ],
        vec![
            vec![true, true, false],
            vec![false, true, true],
            vec![true, false, true],
        ],
        true,
    )
    .unwrap();
    let alphabet = OperatorAlphabet::build(&scenario);
    let nc = CommutationOracle::build(&scenario, &alphabet, true);
    let symmetry = SymmetryGroup::build(&scenario, &alphabet);

    // A 4-operator monomial spanning all three parties: two different
    // operators of B together with one each of A and C, chosen so the
    // whole thing factors into one 3-party atom (not fully knowable,
    // since it disagrees on a shared copy) and one knowable singleton.
    let a = alphabet.by_party(0)[0];
    let b0 = alphabet.by_party(1)[0];
    let b_last = *alphabet.by_party(1).last().unwrap();
    let c0 = alphabet.by_party(2)[0];
    let spec = ColumnSpec::Explicit(vec![vec![], vec![a, b0, b_last, c0]]);

    let mut program = build_program(&scenario, &alphabet, &nc, &symmetry, &spec, false);

    let dist = Distribution::new(vec![2, 2, 2, 1, 1, 1], vec![0.125; 8]).unwrap();
    program.set_distribution(Some(&dist), &HashMap::new());

    let mut checked_any = false;
    for &id in program.generators() {
        if let ValueState::PartiallyKnown { coeff, .. } = program.valuation().state_of(id) {
            assert!((0.0..=1.0).contains(&coeff), "semiknown coefficient {coeff} out of [0, 1]");
            checked_any = true;
        }
    }
    assert!(checked_any, "expected at least one PartiallyKnown (semiknown) monomial in the LPI triangle scenario");
    assert!(!program.valuation().splits().is_empty());
}
