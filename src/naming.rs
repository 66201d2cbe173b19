//! Symbolic name parsing and pretty-printing (distilled §6, §9).
//!
//! Isolated behind this module so the algorithmic core never has to look
//! at strings: compounds and atoms only ever refer to each other by
//! integer id (distilled §9 "Symbolic name parsing and pretty-printing").
//!
//! Naming convention (distilled §6):
//! - Atomic name: `<op_0 op_1 ...>` with operators spelled
//!   `Party_copy1_..._copyNs_setting_outcome`, `0` copies rendered as `0`.
//! - Compound name: `*`-joined atomic names.
//! - Unit name: `1`. Zero name: `0`.

use crate::operator::{CopyIdx, Operator};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    #[error("empty operator token")]
    EmptyToken,
    #[error("operator token {0:?} has too few fields for {1} sources")]
    TooFewFields(String, usize),
    #[error("unknown party name {0:?}")]
    UnknownParty(String),
    #[error("malformed integer field in operator token {0:?}")]
    BadInteger(String),
    #[error("atomic name {0:?} is not wrapped in <...>")]
    MissingBrackets(String),
}

/// Formats a single operator as `Party_copy1_..._copyNs_setting_outcome`.
pub fn operator_name(op: &Operator, party_names: &[String]) -> String {
    let mut parts = vec![party_names[op.party as usize].clone()];
    for &c in &op.copies {
        parts.push(c.to_string());
    }
    parts.push(op.setting.to_string());
    parts.push(op.outcome.to_string());
    parts.join("_")
}

/// Formats an atomic monomial's operators as `<op_0 op_1 ...>`.
pub fn atomic_name(ops: &[&Operator], party_names: &[String]) -> String {
    let inner = ops
        .iter()
        .map(|op| operator_name(op, party_names))
        .collect::<Vec<_>>()
        .join(" ");
    format!("<{inner}>")
}

/// Formats a compound as the `*`-join of its atomic names, or the
/// distinguished `1`/`0` names for the unit/zero monomials.
pub fn compound_name(atomic_names: &[String]) -> String {
    if atomic_names.is_empty() {
        "1".to_string()
    } else {
        atomic_names.join("*")
    }
}

/// Parses a single `Party_copy1_..._copyNs_setting_outcome` operator
/// token back into an [`Operator`] (distilled §6 "Parsing accepts both
/// renderings").
pub fn parse_operator(
    token: &str,
    party_names: &[String],
    n_sources: usize,
) -> Result<Operator, NamingError> {
    if token.is_empty() {
        return Err(NamingError::EmptyToken);
    }
    let fields: Vec<&str> = token.split('_').collect();
    let expected = 1 + n_sources + 2;
    if fields.len() != expected {
        return Err(NamingError::TooFewFields(token.to_string(), n_sources));
    }
    let party = party_names
        .iter()
        .position(|n| n == fields[0])
        .ok_or_else(|| NamingError::UnknownParty(fields[0].to_string()))?;
    let mut copies = smallvec::SmallVec::<[CopyIdx; 4]>::new();
    for f in &fields[1..1 + n_sources] {
        let v: CopyIdx = parse_field(f, token)?;
        copies.push(v);
    }
    let setting: u16 = parse_field(fields[1 + n_sources], token)?;
    let outcome: u16 = parse_field(fields[2 + n_sources], token)?;
    Ok(Operator {
        party: party as u16,
        copies,
        setting,
        outcome,
    })
}

fn parse_field<T: std::str::FromStr>(field: &str, token: &str) -> Result<T, NamingError> {
    let normalized = if field == "\u{2205}" { "0" } else { field };
    normalized
        .parse()
        .map_err(|_| NamingError::BadInteger(token.to_string()))
}

/// Parses an atomic name `<op_0 op_1 ...>` back into its operator tokens.
pub fn parse_atomic_name<'a>(name: &'a str) -> Result<Vec<&'a str>, NamingError> {
    let inner = name
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .ok_or_else(|| NamingError::MissingBrackets(name.to_string()))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    Ok(inner.split(' ').collect())
}

/// Parses a compound name (`*`-joined atomic names, or `1`/`0`) into its
/// atomic name substrings.
pub fn parse_compound_name(name: &str) -> Vec<&str> {
    if name == "1" || name == "0" {
        return Vec::new();
    }
    name.split('*').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{CausalScenario, Party, Source};
    use crate::operator::OperatorAlphabet;

    #[test]
    fn round_trips_an_operator() {
        let scenario = CausalScenario::new(
            vec![Party { name: "A".into(), outcomes: 2, settings: 2, has_children: false }],
            vec![Source { name: "s".into(), inflation_level: 2 }],
            vec![vec![true]],
            true,
        )
        .unwrap();
        let alphabet = OperatorAlphabet::build(&scenario);
        let party_names: Vec<String> = scenario.parties().iter().map(|p| p.name.clone()).collect();
        for op in alphabet.alphabet() {
            let s = operator_name(op, &party_names);
            let back = parse_operator(&s, &party_names, 1).unwrap();
            assert_eq!(&back, op);
        }
    }

    #[test]
    fn unit_and_zero_names() {
        assert_eq!(compound_name(&[]), "1");
        assert!(parse_compound_name("1").is_empty());
        assert!(parse_compound_name("0").is_empty());
    }
}
