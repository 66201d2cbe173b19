//! Moment-matrix builder (component H, distilled §4.H).
//!
//! Builds `Gamma[i][j] = intern(dagger(col_i) ++ col_j)` over a generator
//! list, then quotients the matrix by the inflation symmetry group: cells
//! related by a generator's induced column permutation must hold equal
//! monomials, and are merged to a single representative. Finally compacts
//! the distinct monomial ids that remain into a dense SDP variable index
//! (distilled §4.H "Id compaction").

use std::collections::HashMap;

use fixedbitset::FixedBitSet;

use crate::operator::Rank;
use crate::registry::{CompoundId, MonomialRegistry, ONE_ID, ZERO_ID};
use crate::symmetry::SymmetryGroup;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MomentMatrixError {
    #[error("generator set is empty")]
    Empty,
    #[error("generator 0 must be the unit monomial")]
    UnitNotFirst,
}

/// Union-find over flattened `(i, j)` matrix cells, used to merge symmetry
/// orbits of entries.
struct CellUnionFind {
    parent: Vec<usize>,
}

impl CellUnionFind {
    fn new(n_cells: usize) -> Self {
        Self { parent: (0..n_cells).collect() }
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

/// A built, symmetry-quotiented moment matrix.
#[derive(Debug)]
pub struct MomentMatrix {
    pub size: usize,
    pub generators: Vec<CompoundId>,
    /// `entries[i][j]`: the monomial occupying row `i`, column `j`, after
    /// the symmetry quotient (distilled §4.H step 2).
    pub entries: Vec<Vec<CompoundId>>,
    /// Distinct monomial ids appearing in `entries`, dense, first-seen
    /// order; `var_index` inverts it (distilled §4.H "Id compaction").
    pub distinct_ids: Vec<CompoundId>,
    pub var_index: HashMap<CompoundId, usize>,
}

impl MomentMatrix {
    pub fn get(&self, i: usize, j: usize) -> CompoundId {
        self.entries[i][j]
    }
}

fn compound_bitset(registry: &MonomialRegistry, id: CompoundId) -> FixedBitSet {
    let mut bits = FixedBitSet::with_capacity(registry.alphabet().len());
    for r in registry.ranks_of(id) {
        bits.insert(r.as_usize());
    }
    bits
}

/// Builds the raw, un-quotiented `Gamma` matrix: `entries[i][j] =
/// intern(reverse(col_i) ++ col_j)` (distilled §4.H step 1, dagger =
/// sequence reversal; a no-op on the resulting monomial in the commuting
/// model, meaningful in the non-commuting one).
fn build_raw(
    generators: &[CompoundId],
    registry: &mut MonomialRegistry,
) -> Vec<Vec<CompoundId>> {
    let n = generators.len();
    let ranks: Vec<Vec<Rank>> = generators.iter().map(|&g| registry.ranks_of(g)).collect();
    let mut out = vec![vec![ZERO_ID; n]; n];
    for i in 0..n {
        let dag_i: Vec<Rank> = ranks[i].iter().rev().copied().collect();
        for j in 0..n {
            let mut seq = dag_i.clone();
            seq.extend(ranks[j].iter().copied());
            out[i][j] = registry.intern(&seq);
        }
    }
    out
}

/// Quotients `raw` by the generator set's induced column permutations
/// (distilled §4.H step 2): cells `(i, j)` and `(sigma(i), sigma(j))` must
/// agree for every generator `sigma`. Cells the generator set doesn't
/// close over are left unmerged and logged once.
fn quotient(
    raw: &[Vec<CompoundId>],
    generators: &[CompoundId],
    registry: &MonomialRegistry,
    symmetry: &SymmetryGroup,
) -> Vec<Vec<CompoundId>> {
    let n = generators.len();
    if symmetry.is_trivial() || n == 0 {
        return raw.to_vec();
    }

    let columns: Vec<FixedBitSet> = generators.iter().map(|&g| compound_bitset(registry, g)).collect();
    let perms = symmetry.induced_column_permutations(&columns);

    let mut uf = CellUnionFind::new(n * n);
    let cell = |i: usize, j: usize| i * n + j;
    let mut not_closed = false;
    for perm in &perms {
        for i in 0..n {
            let Some(si) = perm[i] else {
                not_closed = true;
                continue;
            };
            for j in 0..n {
                let Some(sj) = perm[j] else {
                    not_closed = true;
                    continue;
                };
                uf.union(cell(i, j), cell(si, sj));
            }
        }
    }
    if not_closed {
        tracing::warn!(
            "generator set is not closed under the inflation symmetry group; \
             some moment-matrix entries could not be quotiented"
        );
    }

    // Representative value per class: the entry at the class's
    // lexicographically smallest cell.
    let mut class_repr: HashMap<usize, (usize, usize, CompoundId)> = HashMap::new();
    for i in 0..n {
        for j in 0..n {
            let root = uf.find(cell(i, j));
            class_repr
                .entry(root)
                .and_modify(|(ri, rj, _)| {
                    if (i, j) < (*ri, *rj) {
                        *ri = i;
                        *rj = j;
                    }
                })
                .or_insert((i, j, raw[i][j]));
        }
    }
    // Re-resolve values after finding the true lexicographic representative.
    for (_, (ri, rj, v)) in class_repr.iter_mut() {
        *v = raw[*ri][*rj];
    }

    let mut out = vec![vec![ZERO_ID; n]; n];
    for i in 0..n {
        for j in 0..n {
            let root = uf.find(cell(i, j));
            out[i][j] = class_repr[&root].2;
        }
    }
    out
}

/// Builds the full symmetry-quotiented, id-compacted moment matrix
/// (distilled §4.H).
pub fn build_moment_matrix(
    generators: &[CompoundId],
    registry: &mut MonomialRegistry,
    symmetry: &SymmetryGroup,
) -> Result<MomentMatrix, MomentMatrixError> {
    if generators.is_empty() {
        return Err(MomentMatrixError::Empty);
    }
    if generators[0] != ONE_ID {
        return Err(MomentMatrixError::UnitNotFirst);
    }

    let raw = build_raw(generators, registry);
    let entries = quotient(&raw, generators, registry, symmetry);

    let mut distinct_ids = Vec::new();
    let mut var_index = HashMap::new();
    for row in &entries {
        for &id in row {
            var_index.entry(id).or_insert_with(|| {
                distinct_ids.push(id);
                distinct_ids.len() - 1
            });
        }
    }

    Ok(MomentMatrix {
        size: generators.len(),
        generators: generators.to_vec(),
        entries,
        distinct_ids,
        var_index,
    })
}
