//! Causal scenario and distribution inputs (distilled §3, §6).
//!
//! The scenario is immutable input: party/source cardinalities, the
//! bipartite hypergraph of which sources feed which parties, inflation
//! levels, and (for non-network DAGs) an extra knowability predicate. It
//! never mutates after construction (distilled §3 "Lifecycle").
//!
//! Serializable with `serde` so a scenario can be loaded from a JSON
//! config file, the way the donor crate loads SRS parameters from JSON.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Errors raised while validating a [`CausalScenario`] at construction time.
///
/// These are the "malformed input" failures of distilled §7: shape,
/// cardinality, or out-of-range-copy problems. They are fatal and reported
/// at the boundary — a `CausalScenario` that exists is, by construction,
/// well-formed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("need at least one party")]
    NoParties,
    #[error("party {0} has outcome cardinality < 2 (o_p must be >= 2)")]
    BadOutcomeCardinality(usize),
    #[error("party {0} has setting cardinality 0 (s_p must be >= 1)")]
    BadSettingCardinality(usize),
    #[error("source {0} has inflation level 0 (k_s must be >= 1)")]
    BadInflationLevel(usize),
    #[error("hypergraph has {rows} rows but there are {n_sources} sources")]
    HypergraphRowMismatch { rows: usize, n_sources: usize },
    #[error("hypergraph row {source} has {cols} columns but there are {n_parties} parties")]
    HypergraphColMismatch {
        source: usize,
        cols: usize,
        n_parties: usize,
    },
    #[error("party_names has {got} entries, expected {expected}")]
    PartyNamesMismatch { got: usize, expected: usize },
    #[error("distribution data has {got} entries but shape {shape:?} implies {expected}")]
    DistributionShapeMismatch {
        got: usize,
        expected: usize,
        shape: Vec<usize>,
    },
    #[error("malformed scenario JSON: {0}")]
    Json(String),
}

/// A party (observed variable / measurement device), distilled §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    /// `o_p`: number of distinct outcomes.
    pub outcomes: usize,
    /// `s_p`: number of distinct settings (inputs). A party with no
    /// settings still carries `s_p = 1` and always uses `setting = 0`
    /// (distilled §3).
    pub settings: usize,
    /// Whether this is a non-leaf observed node with children downstream
    /// in the causal DAG; affects whether its normalization constraint is
    /// an equality or a Collins–Gisin-folded inequality (distilled §4.I).
    pub has_children: bool,
}

/// A latent common-cause source, distilled §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    /// `k_s`: inflation level (number of copies).
    pub inflation_level: usize,
}

/// The immutable causal scenario: parties, sources, and the bipartite
/// hypergraph of which source feeds which party (distilled §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CausalScenario {
    parties: Vec<Party>,
    sources: Vec<Source>,
    /// `hypergraph[s][p]`: does source `s` feed party `p`.
    hypergraph: Vec<Vec<bool>>,
    /// Whether this is a pure network (Bell-like) scenario. When `false`,
    /// `knowable_extra` may veto knowability for atomic monomials that
    /// would otherwise qualify, per distilled §3's "knowable" definition.
    network: bool,
    /// Non-network additional knowability predicate, keyed by a sorted
    /// description of the atomic monomial's (party, copies, setting)
    /// triples. Not serialized: closures cannot round-trip through JSON,
    /// so scenarios using it are built in Rust, not loaded from config.
    #[serde(skip)]
    knowable_extra: Option<Arc<dyn Fn(&[(usize, Vec<usize>, usize)]) -> bool + Send + Sync>>,
}

impl CausalScenario {
    /// Builds and validates a scenario. All cardinality and shape checks
    /// described in distilled §7 ("Malformed input") happen here, once,
    /// so every other component can treat `CausalScenario` as trusted.
    pub fn new(
        parties: Vec<Party>,
        sources: Vec<Source>,
        hypergraph: Vec<Vec<bool>>,
        network: bool,
    ) -> Result<Self, ScenarioError> {
        if parties.is_empty() {
            return Err(ScenarioError::NoParties);
        }
        for (p, party) in parties.iter().enumerate() {
            if party.outcomes < 2 {
                return Err(ScenarioError::BadOutcomeCardinality(p));
            }
            if party.settings == 0 {
                return Err(ScenarioError::BadSettingCardinality(p));
            }
        }
        for (s, source) in sources.iter().enumerate() {
            if source.inflation_level == 0 {
                return Err(ScenarioError::BadInflationLevel(s));
            }
        }
        if hypergraph.len() != sources.len() {
            return Err(ScenarioError::HypergraphRowMismatch {
                rows: hypergraph.len(),
                n_sources: sources.len(),
            });
        }
        for (s, row) in hypergraph.iter().enumerate() {
            if row.len() != parties.len() {
                return Err(ScenarioError::HypergraphColMismatch {
                    source: s,
                    cols: row.len(),
                    n_parties: parties.len(),
                });
            }
        }
        Ok(Self {
            parties,
            sources,
            hypergraph,
            network,
            knowable_extra: None,
        })
    }

    /// Loads a scenario from a JSON config file (distilled §6 "Scenario
    /// input"; ambient config layer of `SPEC_FULL.md` §A.3, mirroring how
    /// the donor crate loads its SRS parameters from JSON). Validation
    /// still runs: a deserialized scenario goes through the same
    /// cardinality/shape checks as one built with [`CausalScenario::new`].
    /// `knowable_extra` never round-trips (closures aren't serializable);
    /// scenarios needing it must attach it afterward with
    /// [`CausalScenario::with_knowable_extra`].
    pub fn from_json(s: &str) -> Result<Self, ScenarioError> {
        #[derive(Deserialize)]
        struct Raw {
            parties: Vec<Party>,
            sources: Vec<Source>,
            hypergraph: Vec<Vec<bool>>,
            network: bool,
        }
        let raw: Raw = serde_json::from_str(s).map_err(|e| ScenarioError::Json(e.to_string()))?;
        Self::new(raw.parties, raw.sources, raw.hypergraph, raw.network)
    }

    /// Serializes the scenario back to the same JSON shape `from_json`
    /// reads (the non-serializable `knowable_extra` predicate is dropped).
    pub fn to_json(&self) -> Result<String, ScenarioError> {
        serde_json::to_string_pretty(self).map_err(|e| ScenarioError::Json(e.to_string()))
    }

    /// Attaches the non-network extra knowability predicate (distilled §6).
    #[must_use]
    pub fn with_knowable_extra(
        mut self,
        predicate: Arc<dyn Fn(&[(usize, Vec<usize>, usize)]) -> bool + Send + Sync>,
    ) -> Self {
        self.knowable_extra = Some(predicate);
        self
    }

    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn n_parties(&self) -> usize {
        self.parties.len()
    }

    pub fn n_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn feeds(&self, source: usize, party: usize) -> bool {
        self.hypergraph[source][party]
    }

    pub fn inflation_level(&self, source: usize) -> usize {
        self.sources[source].inflation_level
    }

    pub fn is_network(&self) -> bool {
        self.network
    }

    /// Evaluates the extra knowability predicate, if any (always `true`
    /// when the scenario is a pure network, per distilled §3).
    pub fn knowable_extra(&self, atoms: &[(usize, Vec<usize>, usize)]) -> bool {
        match &self.knowable_extra {
            Some(f) => f(atoms),
            None => true,
        }
    }
}

/// A dense joint-probability tensor indexed `[a_1..a_Np, x_1..x_Np]`,
/// shape `(o_1..o_Np, s_1..s_Np)` (distilled §6 "Distribution input").
#[derive(Debug, Clone)]
pub struct Distribution {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Distribution {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, ScenarioError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ScenarioError::DistributionShapeMismatch {
                got: data.len(),
                expected,
                shape,
            });
        }
        Ok(Self { shape, data })
    }

    /// Looks up `P(a_1,...,a_Np | x_1,...,x_Np)` by (outcome, setting) index
    /// per party, row-major per distilled §6's tensor shape convention.
    pub fn get(&self, outcomes: &[usize], settings: &[usize]) -> f64 {
        let n = outcomes.len();
        debug_assert_eq!(settings.len(), n);
        debug_assert_eq!(self.shape.len(), 2 * n);
        let mut idx = 0usize;
        let mut stride = 1usize;
        // Row-major over the full (outcomes..settings) index tuple: walk
        // dimensions from last to first, accumulating the flat offset.
        for i in (0..n).rev() {
            idx += settings[i] * stride;
            stride *= self.shape[n + i];
        }
        for i in (0..n).rev() {
            idx += outcomes[i] * stride;
            stride *= self.shape[i];
        }
        self.data[idx]
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
}
