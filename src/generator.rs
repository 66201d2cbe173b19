//! Generator (component G, distilled §4.G).
//!
//! Produces the candidate monomial set from one of six specification
//! styles. Every candidate is pushed through the canonicalizer via
//! [`crate::registry::MonomialRegistry::intern`]; zero outputs are
//! discarded and duplicates collapse automatically (registry dedup is the
//! canonicalization-equality of distilled §3's "Invariants").
//!
//! [`ColumnSpec::parse`] additionally understands the original
//! `apozas/inflation` column-specification grammar (plain `"npaN"` /
//! `"localN"` / `"physicalN"` strings, and explicit party-index-list
//! blocks), the supplement named in `SPEC_FULL.md` §B.

use itertools::Itertools;

use crate::operator::{OperatorAlphabet, Rank};
use crate::registry::{CompoundId, MonomialRegistry, ONE_ID};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    #[error("explicit symbol list must have the unit (empty monomial) first")]
    UnitNotFirst,
    #[error("party index {0} out of range")]
    PartyOutOfRange(usize),
    #[error("column specification string {0:?} is not recognized")]
    UnrecognizedSpec(String),
}

/// The six generator-set specification styles of distilled §4.G.
#[derive(Debug, Clone)]
pub enum ColumnSpec {
    /// All products of at most `N` single-party operators, party indices
    /// non-decreasing.
    Npa(usize),
    /// All monomials with at most `N` operators per party.
    Local(usize),
    /// Subset of `Local(N)` whose atomic factors are PSD by construction.
    Physical(usize),
    /// Explicit list of lists of party indices; one candidate monomial per
    /// cartesian product of measurements at the listed parties.
    PartyBlocks(Vec<Vec<usize>>),
    /// Caller-supplied list of monomials (as rank sequences); unit
    /// (empty sequence) must be first.
    Explicit(Vec<Vec<Rank>>),
    /// Raw bitvectors over the operator alphabet, for the LP path.
    RawBitvectors(Vec<fixedbitset::FixedBitSet>),
}

impl ColumnSpec {
    /// Parses the original package's plain-string column specifications
    /// (`"npa2"`, `"local1"`, `"physical1"`).
    pub fn parse(s: &str) -> Result<Self, GeneratorError> {
        if let Some(n) = s.strip_prefix("npa") {
            return n
                .parse()
                .map(ColumnSpec::Npa)
                .map_err(|_| GeneratorError::UnrecognizedSpec(s.to_string()));
        }
        if let Some(n) = s.strip_prefix("local") {
            return n
                .parse()
                .map(ColumnSpec::Local)
                .map_err(|_| GeneratorError::UnrecognizedSpec(s.to_string()));
        }
        if let Some(n) = s.strip_prefix("physical") {
            return n
                .parse()
                .map(ColumnSpec::Physical)
                .map_err(|_| GeneratorError::UnrecognizedSpec(s.to_string()));
        }
        Err(GeneratorError::UnrecognizedSpec(s.to_string()))
    }
}

/// All non-decreasing-index length-`k` sequences drawn (with repetition)
/// from `items`, which must already be sorted.
fn combinations_with_replacement(items: &[Rank], k: usize) -> Vec<Vec<Rank>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        for mut rest in combinations_with_replacement(&items[i..], k - 1) {
            let mut v = Vec::with_capacity(k);
            v.push(items[i]);
            v.append(&mut rest);
            out.push(v);
        }
    }
    out
}

fn per_party_local(alphabet: &OperatorAlphabet, party: usize, max_len: usize) -> Vec<Vec<Rank>> {
    let ranks = alphabet.by_party(party);
    let mut out = Vec::new();
    for len in 0..=max_len {
        out.extend(combinations_with_replacement(ranks, len));
    }
    out
}

/// Whether `seq` is "physical": no two operators at *different* parties
/// share a common, equal nonzero copy index on any source (distilled
/// §4.G `physicalN`: "copies strictly disjoint per source").
fn is_physical(seq: &[Rank], alphabet: &OperatorAlphabet, n_sources: usize) -> bool {
    for i in 0..seq.len() {
        let a = alphabet.operator(seq[i]);
        for j in (i + 1)..seq.len() {
            let b = alphabet.operator(seq[j]);
            if a.party == b.party {
                continue;
            }
            for s in 0..n_sources {
                if a.copies[s] != 0 && b.copies[s] != 0 && a.copies[s] == b.copies[s] {
                    return false;
                }
            }
        }
    }
    true
}

/// Builds the generator set, interning every candidate, and returns the
/// compound ids with `generators[0] == ONE_ID` (required by the
/// moment-matrix builder, distilled §4.H).
pub fn build_generators(
    spec: &ColumnSpec,
    registry: &mut MonomialRegistry,
) -> Result<Vec<CompoundId>, GeneratorError> {
    let alphabet_len = registry.alphabet().len();
    let n_parties = registry.scenario().n_parties();
    let n_sources = registry.scenario().n_sources();

    let raw_candidates: Vec<Vec<Rank>> = match spec {
        ColumnSpec::Npa(n) => {
            let all_ranks: Vec<Rank> = (0..alphabet_len as u32).map(Rank).collect();
            (0..=*n)
                .flat_map(|len| combinations_with_replacement(&all_ranks, len))
                .collect()
        }
        ColumnSpec::Local(n) => {
            let per_party: Vec<Vec<Vec<Rank>>> = (0..n_parties)
                .map(|p| per_party_local(registry.alphabet(), p, *n))
                .collect();
            per_party
                .into_iter()
                .multi_cartesian_product()
                .map(|chunks| chunks.into_iter().flatten().collect())
                .collect()
        }
        ColumnSpec::Physical(n) => {
            let per_party: Vec<Vec<Vec<Rank>>> = (0..n_parties)
                .map(|p| per_party_local(registry.alphabet(), p, *n))
                .collect();
            per_party
                .into_iter()
                .multi_cartesian_product()
                .map(|chunks| -> Vec<Rank> { chunks.into_iter().flatten().collect() })
                .filter(|seq| is_physical(seq, registry.alphabet(), n_sources))
                .collect()
        }
        ColumnSpec::PartyBlocks(blocks) => {
            let mut out = Vec::new();
            for block in blocks {
                for &p in block {
                    if p >= n_parties {
                        return Err(GeneratorError::PartyOutOfRange(p));
                    }
                }
                if block.is_empty() {
                    out.push(Vec::new());
                    continue;
                }
                let per_position: Vec<&[Rank]> =
                    block.iter().map(|&p| registry.alphabet().by_party(p)).collect();
                for combo in per_position.into_iter().multi_cartesian_product() {
                    out.push(combo);
                }
            }
            out
        }
        ColumnSpec::Explicit(monomials) => {
            if monomials.first().map(|m| !m.is_empty()).unwrap_or(true) {
                return Err(GeneratorError::UnitNotFirst);
            }
            monomials.clone()
        }
        ColumnSpec::RawBitvectors(bitvecs) => bitvecs
            .iter()
            .map(|b| b.ones().map(|i| Rank(i as u32)).collect())
            .collect(),
    };

    let mut ids: Vec<CompoundId> = Vec::with_capacity(raw_candidates.len());
    let mut seen = std::collections::HashSet::new();
    // The unit must come first regardless of generation order, matching
    // `InflationLP`'s `assert self.monomials[0] == self.One` invariant.
    ids.push(ONE_ID);
    seen.insert(ONE_ID);
    for cand in raw_candidates {
        let id = registry.intern(&cand);
        if id != crate::registry::ZERO_ID && seen.insert(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
