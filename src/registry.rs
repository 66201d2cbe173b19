//! Monomial registry (component F, distilled §4.F).
//!
//! A grow-only interning store, keyed by the blake3 hash of the canonical
//! byte image (distilled §9 "Global mutable caches ... grow-only and keyed
//! by byte-image of the canonical bitvector"), with two tables:
//!
//! - `atomic_by_hash`: canonical byte key -> interned [`Atomic`].
//! - `compound_by_atoms`: sorted tuple of atomic ids -> interned [`Compound`].
//!
//! Ids are dense and stable within a session; `0` is reserved for zero and
//! `1` for the unit (distilled §3 "Invariants"). Compounds never hold a
//! reference back to their atoms, only ids (distilled §9 "Cyclic
//! references ... eliminated by an arena + integer ids").

use std::collections::HashMap;

use crate::canon::{canonicalize_commuting, canonicalize_ordered, Canonical};
use crate::commutation::CommutationOracle;
use crate::factor::{atomic_is_knowable, factorize};
use crate::naming::{atomic_name, compound_name};
use crate::operator::{Operator, OperatorAlphabet, Rank};
use crate::scenario::CausalScenario;
use crate::symmetry::SymmetryGroup;

pub type AtomicId = u32;
pub type CompoundId = u32;

pub const ZERO_ID: CompoundId = 0;
pub const ONE_ID: CompoundId = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("atomic id {0} is not registered")]
    UnknownAtomic(AtomicId),
    #[error("compound id {0} is not registered")]
    UnknownCompound(CompoundId),
}

/// An atomic monomial: a connected (by shared inflation copy) group of
/// operators, stored at its symmetry-orbit representative (distilled §3,
/// §4.E "Orbit representative -> unique stored form").
#[derive(Debug, Clone)]
pub struct Atomic {
    pub id: AtomicId,
    pub operators: Vec<Rank>,
    pub knowable: bool,
    pub name: String,
}

/// A compound monomial: a multiset of atomic ids (distilled §3).
#[derive(Debug, Clone)]
pub struct Compound {
    pub id: CompoundId,
    pub atoms: Vec<AtomicId>,
    pub name: String,
}

/// Grow-only interning registry for the lifetime of one scenario
/// (distilled §5 "the registry is the only large mutable structure; it
/// grows monotonically").
pub struct MonomialRegistry<'s> {
    scenario: &'s CausalScenario,
    alphabet: &'s OperatorAlphabet,
    nc: &'s CommutationOracle,
    symmetry: &'s SymmetryGroup,
    party_names: Vec<String>,

    atomic_by_hash: HashMap<[u8; 32], AtomicId>,
    atoms: Vec<Atomic>,
    compound_by_atoms: HashMap<Vec<AtomicId>, CompoundId>,
    compounds: Vec<Compound>,
}

impl<'s> MonomialRegistry<'s> {
    pub fn new(
        scenario: &'s CausalScenario,
        alphabet: &'s OperatorAlphabet,
        nc: &'s CommutationOracle,
        symmetry: &'s SymmetryGroup,
    ) -> Self {
        let party_names = scenario.parties().iter().map(|p| p.name.clone()).collect();
        let mut reg = Self {
            scenario,
            alphabet,
            nc,
            symmetry,
            party_names,
            atomic_by_hash: HashMap::new(),
            atoms: Vec::new(),
            compound_by_atoms: HashMap::new(),
            compounds: Vec::new(),
        };
        // Reserve id 1 = unit, the empty multiset of atoms.
        reg.compound_by_atoms.insert(Vec::new(), ONE_ID);
        reg.compounds.push(Compound {
            id: ONE_ID,
            atoms: Vec::new(),
            name: "1".to_string(),
        });
        reg
    }

    pub fn alphabet(&self) -> &OperatorAlphabet {
        self.alphabet
    }

    pub fn scenario(&self) -> &CausalScenario {
        self.scenario
    }

    pub fn atom(&self, id: AtomicId) -> &Atomic {
        &self.atoms[id as usize]
    }

    pub fn atoms(&self) -> &[Atomic] {
        &self.atoms
    }

    /// `compounds()[0]` is the unit, `id == 1`; `id == 0` (zero) is never
    /// stored as a `Compound` and must be special-cased by callers.
    pub fn compounds(&self) -> &[Compound] {
        &self.compounds
    }

    pub fn compound(&self, id: CompoundId) -> Option<&Compound> {
        if id == ZERO_ID {
            None
        } else {
            self.compounds.iter().find(|c| c.id == id)
        }
    }

    /// The flattened operator-rank sequence underlying `id` (the unit and
    /// zero both flatten to the empty sequence). Used by the moment-matrix
    /// builder and constraint assembler, which both need to re-derive and
    /// re-intern sub-monomials.
    pub fn ranks_of(&self, id: CompoundId) -> Vec<Rank> {
        if id == ZERO_ID || id == ONE_ID {
            return Vec::new();
        }
        match self.compound(id) {
            Some(c) => c
                .atoms
                .iter()
                .flat_map(|&a| self.atom(a).operators.iter().copied())
                .collect(),
            None => Vec::new(),
        }
    }

    fn canonicalize(&self, ranks: &[Rank]) -> Canonical {
        if self.nc.commuting_model() {
            canonicalize_commuting(ranks, self.alphabet)
        } else {
            canonicalize_ordered(ranks, self.alphabet, self.nc)
        }
    }

    /// Interns an atomic factor (already one connected component) at its
    /// symmetry-orbit representative, deduplicating by canonical hash
    /// (distilled §4.F).
    fn intern_atomic(&mut self, ranks: &[Rank]) -> AtomicId {
        let repr = if self.nc.commuting_model() {
            let mut bits = fixedbitset::FixedBitSet::with_capacity(self.alphabet.len());
            for &r in ranks {
                bits.insert(r.as_usize());
            }
            let rep_bits = self.symmetry.orbit_representative_bitset(&bits);
            rep_bits.ones().map(|i| Rank(i as u32)).collect::<Vec<_>>()
        } else {
            let alphabet = self.alphabet;
            let nc = self.nc;
            self.symmetry.orbit_representative_ordered(ranks, |s| {
                match canonicalize_ordered(s, alphabet, nc) {
                    Canonical::Ordered(v) => v,
                    Canonical::Zero => Vec::new(),
                    Canonical::Commuting(_) => unreachable!(),
                }
            })
        };

        let key = canonical_hash(&repr);
        if let Some(&id) = self.atomic_by_hash.get(&key) {
            return id;
        }
        let ops: Vec<&Operator> = repr.iter().map(|&r| self.alphabet.operator(r)).collect();
        let knowable = atomic_is_knowable(&ops, self.scenario.n_sources())
            && self.scenario.knowable_extra(&atom_descriptor(&ops));
        let name = atomic_name(&ops, &self.party_names);
        let id = self.atoms.len() as AtomicId;
        tracing::debug!(hash = %hex::encode(key), %name, knowable, "interning new atomic monomial");
        self.atoms.push(Atomic {
            id,
            operators: repr,
            knowable,
            name,
        });
        self.atomic_by_hash.insert(key, id);
        id
    }

    /// Interns a full monomial given as a sequence of operator ranks:
    /// canonicalize, factor, intern each atomic factor, then intern the
    /// resulting compound (distilled §4.F "On lookup miss").
    ///
    /// Returns `ZERO_ID` if canonicalization annihilates the monomial.
    pub fn intern(&mut self, ranks: &[Rank]) -> CompoundId {
        let canon = self.canonicalize(ranks);
        if canon.is_zero() {
            return ZERO_ID;
        }
        let factors = factorize(&canon, self.alphabet);
        let mut atom_ids: Vec<AtomicId> = factors.iter().map(|f| self.intern_atomic(f)).collect();
        self.intern_from_atoms(&mut atom_ids)
    }

    /// Interns a compound directly from a list of already-interned atomic
    /// ids (used by the factorization path above, and by the valuation
    /// engine when assembling a "remaining unknown sub-compound" for LPI).
    pub fn intern_from_atoms(&mut self, atom_ids: &mut [AtomicId]) -> CompoundId {
        atom_ids.sort_unstable();
        if let Some(&id) = self.compound_by_atoms.get(atom_ids) {
            return id;
        }
        let names: Vec<String> = atom_ids.iter().map(|&a| self.atoms[a as usize].name.clone()).collect();
        let name = compound_name(&names);
        let id = (self.compounds.len() + 1) as CompoundId; // +1: id 0 is zero, not stored
        self.compounds.push(Compound {
            id,
            atoms: atom_ids.to_vec(),
            name,
        });
        self.compound_by_atoms.insert(atom_ids.to_vec(), id);
        id
    }
}

fn canonical_hash(ranks: &[Rank]) -> [u8; 32] {
    let mut bytes = Vec::with_capacity(ranks.len() * 4);
    for r in ranks {
        bytes.extend_from_slice(&r.0.to_le_bytes());
    }
    *blake3::hash(&bytes).as_bytes()
}

fn atom_descriptor(ops: &[&Operator]) -> Vec<(usize, Vec<usize>, usize)> {
    ops.iter()
        .map(|op| {
            (
                op.party as usize,
                op.copies.iter().map(|&c| c as usize).collect(),
                op.setting as usize,
            )
        })
        .collect()
}
