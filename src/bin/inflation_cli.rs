//! Minimal CLI: builds a causal scenario from a column specification and
//! prints the resulting generator set and moment matrix.
//!
//! ```text
//! inflation_cli --scenario chsh --columns npa1
//! inflation_cli --scenario bilocal --columns local1 --sdp=false
//! ```

use anyhow::{anyhow, Result};

use inflation_relax::commutation::CommutationOracle;
use inflation_relax::generator::ColumnSpec;
use inflation_relax::operator::OperatorAlphabet;
use inflation_relax::program::InflationProgram;
use inflation_relax::scenario::{CausalScenario, Party, Source};
use inflation_relax::symmetry::SymmetryGroup;

fn chsh_scenario() -> Result<CausalScenario> {
    Ok(CausalScenario::new(
        vec![
            Party { name: "A".into(), outcomes: 2, settings: 2, has_children: false },
            Party { name: "B".into(), outcomes: 2, settings: 2, has_children: false },
        ],
        vec![Source { name: "lambda".into(), inflation_level: 2 }],
        vec![vec![true, true]],
        true,
    )?)
}

fn bilocal_scenario() -> Result<CausalScenario> {
    Ok(CausalScenario::new(
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
    )?)
}

fn flag(args: &[String], name: &str, default: &str) -> String {
    if let Some(pos) = args.iter().position(|s| s == name) {
        return args.get(pos + 1).cloned().unwrap_or_else(|| default.to_string());
    }
    let prefix = format!("{name}=");
    if let Some(arg) = args.iter().find(|s| s.starts_with(&prefix)) {
        return arg[prefix.len()..].to_string();
    }
    default.to_string()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let scenario_name = flag(&args, "--scenario", "chsh");
    let scenario_file = flag(&args, "--scenario-file", "");
    let columns = flag(&args, "--columns", "npa1");
    let sdp: bool = flag(&args, "--sdp", "true").parse().unwrap_or(true);

    let scenario = if !scenario_file.is_empty() {
        let contents = std::fs::read_to_string(&scenario_file)
            .map_err(|e| anyhow!("reading {scenario_file:?}: {e}"))?;
        CausalScenario::from_json(&contents).map_err(|e| anyhow!("{e}"))?
    } else {
        match scenario_name.as_str() {
            "chsh" => chsh_scenario()?,
            "bilocal" => bilocal_scenario()?,
            other => return Err(anyhow!("unknown --scenario {other:?} (expected chsh or bilocal)")),
        }
    };

    let alphabet = OperatorAlphabet::build(&scenario);
    let nc = CommutationOracle::build(&scenario, &alphabet, true);
    let symmetry = SymmetryGroup::build(&scenario, &alphabet);
    let spec = ColumnSpec::parse(&columns).map_err(|e| anyhow!("{e}"))?;

    let program = InflationProgram::build(&scenario, &alphabet, &nc, &symmetry, &spec, sdp, false)?;

    println!("scenario: {scenario_name} ({} parties, {} sources)", scenario.n_parties(), scenario.n_sources());
    println!("operator alphabet size: {}", alphabet.len());
    println!("generator set size: {}", program.generators().len());
    println!(
        "normalization equalities: {}, cg-fold inequalities: {}",
        program.constraints().equalities.len(),
        program.constraints().inequalities.len()
    );

    if let Some(mm) = program.moment_matrix() {
        println!("moment matrix: {0}x{0}, {1} distinct monomials", mm.size, mm.distinct_ids.len());
    } else {
        println!("moment matrix: not built (LP path)");
    }

    let export = program.export(&[], false);
    if let Some(names) = &export.moment_matrix {
        println!("Gamma[0][..]: {:?}", names[0]);
    }

    Ok(())
}
