//! Factorizer (component D, distilled §4.D).
//!
//! Splits a canonical monomial into independent atomic factors by taking
//! connected components of the "shares a nonzero, equal copy index on some
//! source" relation over its operators. Because this relation is exactly
//! the one the inflation symmetry group acts on, factorization is
//! invariant under canonicalization (distilled §4.D).

use crate::canon::Canonical;
use crate::operator::{Operator, OperatorAlphabet, Rank};

/// Whether `a` and `b` share at least one source on which both carry the
/// same nonzero copy index (distilled §3 "Atomic monomial").
fn shares_copy(a: &Operator, b: &Operator) -> bool {
    a.copies.iter().zip(b.copies.iter()).any(|(&x, &y)| x != 0 && x == y)
}

/// Union-find over a monomial's operators, by connectivity through shared
/// inflation copies.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Splits `mon` into its atomic factors, each a sorted `Vec<Rank>`. An
/// empty monomial (the unit) factors into zero atoms. Factor order in the
/// returned `Vec` is by each factor's minimum rank, for determinism.
pub fn factorize(mon: &Canonical, alphabet: &OperatorAlphabet) -> Vec<Vec<Rank>> {
    let ranks = mon.ranks();
    if ranks.is_empty() {
        return Vec::new();
    }
    let n = ranks.len();
    let mut uf = UnionFind::new(n);
    for i in 0..n {
        let a = alphabet.operator(ranks[i]);
        for j in (i + 1)..n {
            let b = alphabet.operator(ranks[j]);
            if shares_copy(a, b) {
                uf.union(i, j);
            }
        }
    }

    let mut groups: std::collections::HashMap<usize, Vec<Rank>> = std::collections::HashMap::new();
    for i in 0..n {
        let root = uf.find(i);
        groups.entry(root).or_default().push(ranks[i]);
    }

    let mut factors: Vec<Vec<Rank>> = groups.into_values().collect();
    for f in &mut factors {
        f.sort();
    }
    factors.sort_by_key(|f| f[0]);
    factors
}

/// Whether an atomic factor (already-connected operator group) is
/// knowable: every operator agrees on the copy index for every source any
/// of them touches (distilled §3).
pub fn atomic_is_knowable(ops: &[&Operator], n_sources: usize) -> bool {
    for s in 0..n_sources {
        let mut seen: Option<u16> = None;
        for op in ops {
            let c = op.copies[s];
            if c != 0 {
                match seen {
                    None => seen = Some(c),
                    Some(v) if v != c => return false,
                    _ => {}
                }
            }
        }
    }
    true
}
