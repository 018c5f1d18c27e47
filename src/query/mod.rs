//! # Partial-Match Queries
//!
//! A partial-match query supplies values for some attributes and `?` for
//! the rest. Because bucket addresses are assembled bit-by-bit from
//! attribute hashes, every known attribute pins the combined-hash bits
//! drawn from it, and every wildcard leaves its bits free. The query
//! layer turns that into a candidate-bucket set and streams matching
//! tuples out of exactly those buckets.
//!
//! ## Query Data Flow
//!
//! ```text
//! pattern ──> classify choice-vector bits (known value / unknown)
//!                      │
//!                      ▼
//!          enumerate candidate buckets over bits [0, depth+1)
//!          (bit `depth` only matters for buckets below sp)
//!                      │
//!                      ▼
//!          scan candidates in ascending ID order:
//!          primary page, then the overflow chain, tuple by tuple,
//!          keeping only full pattern matches
//! ```
//!
//! Candidate enumeration is pure bit arithmetic on `(known bits, known
//! mask, depth, sp)` and visits `2^u` buckets for `u` unknown address
//! bits; an all-known pattern visits exactly one. Tuples that share a
//! candidate bucket without matching the pattern (hash collisions,
//! wildcard widening) are filtered by the full tuple match during the
//! scan.

use eyre::Result;
use smallvec::{smallvec, SmallVec};

use crate::bits::{bit_is_set, Bits};
use crate::chvec::ChoiceVector;
use crate::hash::hash_bytes;
use crate::relation::Relation;
use crate::storage::PageId;
use crate::tuple::{Pattern, Tuple};

/// The per-bit classification of a pattern: for each combined-hash bit,
/// whether the pattern determines it and, if so, its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitPattern {
    known_bits: Bits,
    known_mask: Bits,
}

impl BitPattern {
    /// Classifies each choice-vector bit against a pattern: bits drawn
    /// from wildcard attributes are unknown, the rest take the value of
    /// the named bit of the attribute's hash.
    pub fn classify(cv: &ChoiceVector, pattern: &Pattern) -> Self {
        let hashes: SmallVec<[Option<Bits>; 8]> = pattern
            .fields()
            .iter()
            .map(|f| f.map(|v| hash_bytes(v.as_bytes())))
            .collect();
        let mut known_bits: Bits = 0;
        let mut known_mask: Bits = 0;
        for (i, entry) in cv.entries().iter().enumerate() {
            if let Some(hash) = hashes[entry.attr as usize] {
                known_mask |= 1 << i;
                if bit_is_set(hash, entry.bit) {
                    known_bits |= 1 << i;
                }
            }
        }
        Self {
            known_bits,
            known_mask,
        }
    }

    /// Direct construction, mainly for tests of the enumeration rules.
    pub fn from_raw(known_bits: Bits, known_mask: Bits) -> Self {
        Self {
            known_bits: known_bits & known_mask,
            known_mask,
        }
    }

    fn is_known(&self, i: u32) -> bool {
        bit_is_set(self.known_mask, i)
    }

    fn value(&self, i: u32) -> Bits {
        (self.known_bits >> i) & 1
    }
}

/// Enumerates every bucket ID in `[0, 2^depth + sp)` consistent with the
/// known bits, in ascending order. Address bits `[0, depth)` are fixed or
/// doubled; bit `depth` participates only for base addresses below the
/// split pointer (those buckets were split this round and carry one more
/// address bit).
pub fn candidate_buckets(bits: &BitPattern, depth: u32, sp: u32) -> SmallVec<[PageId; 8]> {
    let mut bases: SmallVec<[Bits; 8]> = smallvec![0];
    for i in 0..depth {
        if bits.is_known(i) {
            let value = bits.value(i) << i;
            for base in bases.iter_mut() {
                *base |= value;
            }
        } else {
            let doubled: SmallVec<[Bits; 8]> =
                bases.iter().map(|base| *base | (1 << i)).collect();
            bases.extend(doubled);
        }
    }

    let mut out: SmallVec<[PageId; 8]> = SmallVec::with_capacity(bases.len());
    for base in bases {
        if base >= sp {
            out.push(base);
        } else if bits.is_known(depth) {
            out.push(base | (bits.value(depth) << depth));
        } else {
            out.push(base);
            out.push(base + (1 << depth));
        }
    }
    out.sort_unstable();
    out
}

/// A lazy, restartable cursor over the tuples matching a pattern.
///
/// The cursor state is `(candidate index, overflow page, offset within
/// the page body)`; each `next_tuple` call re-reads the current page, so
/// a scan holds no page buffer between calls. Buckets are visited in
/// ascending ID order, each bucket primary-first then along its chain,
/// and each page in insertion order.
pub struct PartialScan<'r> {
    rel: &'r mut Relation,
    pattern: Pattern,
    candidates: SmallVec<[PageId; 8]>,
    cand_index: usize,
    ovflow_page: Option<PageId>,
    offset: usize,
}

impl<'r> PartialScan<'r> {
    pub(crate) fn new(rel: &'r mut Relation, pattern: Pattern) -> Result<Self> {
        let bits = BitPattern::classify(rel.choice_vector(), &pattern);
        let candidates = candidate_buckets(&bits, rel.depth(), rel.split_pointer());
        debug_assert!(candidates.iter().all(|&c| c < rel.page_count()));
        Ok(Self {
            rel,
            pattern,
            candidates,
            cand_index: 0,
            ovflow_page: None,
            offset: 0,
        })
    }

    /// The buckets this scan will visit, in visit order.
    pub fn candidates(&self) -> &[PageId] {
        &self.candidates
    }

    /// Returns the next matching tuple, or `None` at end of stream.
    pub fn next_tuple(&mut self) -> Result<Option<Tuple>> {
        while self.cand_index < self.candidates.len() {
            let page = match self.ovflow_page {
                Some(id) => self.rel.ovflow_file_mut().read_page(id)?,
                None => {
                    let bucket = self.candidates[self.cand_index];
                    self.rel.data_file_mut().read_page(bucket)?
                }
            };

            let mut tuples = page.tuples_from(self.offset);
            while let Some(tuple) = tuples.next() {
                if self.pattern.matches(tuple) {
                    let found = Tuple::from_stored(tuple);
                    self.offset = tuples.offset();
                    return Ok(Some(found));
                }
            }

            // page exhausted: follow the chain, else move to the next bucket
            self.offset = 0;
            match page.ovflow() {
                Some(next) => self.ovflow_page = Some(next),
                None => {
                    self.ovflow_page = None;
                    self.cand_index += 1;
                }
            }
        }
        Ok(None)
    }
}

impl Iterator for PartialScan<'_> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_tuple().transpose()
    }
}
