//! # Choice Vector
//!
//! The choice vector is the rule that turns per-attribute hashes into one
//! combined 32-bit hash: entry `i` names the attribute and the bit of
//! that attribute's hash which becomes bit `i` of the combined value.
//! Bit 0 is the least significant. The vector is fixed at relation
//! creation and persisted verbatim in the `.info` file.
//!
//! ## Textual form
//!
//! A creation-time spec is a comma-separated list of `attr:bit` pairs,
//! e.g. `0:0,1:0,0:1,1:1`. Up to 32 pairs may be given; missing entries
//! are completed round-robin across the attributes with ascending bit
//! numbers, so a short spec still covers every combined-hash bit and
//! spreads the remainder roughly evenly.
//!
//! ## On-disk form
//!
//! Exactly 32 little-endian `(attr, bit)` pairs of `u32`s, written after
//! the relation header. [`ChVecEntry`] is the zerocopy view of one pair.

use eyre::{ensure, Result};
use smallvec::SmallVec;
use std::fmt;
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::bits::{bit_is_set, Bits};
use crate::config::{HASH_BITS, MAX_CHOICE_BITS};
use crate::hash::hash_bytes;

/// One persisted choice-vector entry.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct ChVecEntry {
    attr: U32,
    bit: U32,
}

pub const CHVEC_ENTRY_SIZE: usize = 8;
const _: () = assert!(std::mem::size_of::<ChVecEntry>() == CHVEC_ENTRY_SIZE);

/// One in-memory choice-vector entry: which bit of which attribute's hash
/// feeds this position of the combined hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceBit {
    pub attr: u32,
    pub bit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceVector {
    entries: [ChoiceBit; MAX_CHOICE_BITS],
}

impl ChoiceVector {
    /// Parses a textual spec for a relation with `nattrs` attributes.
    pub fn parse(nattrs: u32, spec: &str) -> Result<Self> {
        ensure!(nattrs > 0, "choice vector needs at least one attribute");
        let mut entries = [ChoiceBit { attr: 0, bit: 0 }; MAX_CHOICE_BITS];
        let mut count = 0usize;

        for pair in spec.split(',') {
            let pair = pair.trim();
            ensure!(!pair.is_empty(), "empty entry in choice vector '{}'", spec);
            ensure!(
                count < MAX_CHOICE_BITS,
                "choice vector '{}' has more than {} entries",
                spec,
                MAX_CHOICE_BITS
            );
            let (attr, bit) = pair.split_once(':').ok_or_else(|| {
                eyre::eyre!("malformed choice vector entry '{}' (expected attr:bit)", pair)
            })?;
            let attr: u32 = attr
                .parse()
                .map_err(|_| eyre::eyre!("bad attribute index '{}' in choice vector", attr))?;
            let bit: u32 = bit
                .parse()
                .map_err(|_| eyre::eyre!("bad bit index '{}' in choice vector", bit))?;
            ensure!(
                attr < nattrs,
                "choice vector references attribute {} but the relation has {}",
                attr,
                nattrs
            );
            ensure!(
                (bit as usize) < HASH_BITS,
                "choice vector references hash bit {} (max {})",
                bit,
                HASH_BITS - 1
            );
            entries[count] = ChoiceBit { attr, bit };
            count += 1;
        }
        ensure!(count > 0, "empty choice vector spec");

        // complete short specs round-robin over the attributes
        for (i, entry) in entries.iter_mut().enumerate().skip(count) {
            *entry = ChoiceBit {
                attr: i as u32 % nattrs,
                bit: i as u32 / nattrs,
            };
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ChoiceBit; MAX_CHOICE_BITS] {
        &self.entries
    }

    /// Assembles the combined hash for one tuple's attribute values.
    /// `vals` must hold every attribute in schema order; entries were
    /// bounds-checked against the attribute count at parse/open time.
    pub fn combined_hash(&self, vals: &[&str]) -> Bits {
        let hashes: SmallVec<[Bits; 8]> =
            vals.iter().map(|v| hash_bytes(v.as_bytes())).collect();
        let mut combined: Bits = 0;
        for (i, entry) in self.entries.iter().enumerate() {
            if bit_is_set(hashes[entry.attr as usize], entry.bit) {
                combined |= 1 << i;
            }
        }
        combined
    }

    /// The persisted form: 32 little-endian pairs.
    pub fn to_disk(&self) -> [ChVecEntry; MAX_CHOICE_BITS] {
        self.entries.map(|e| ChVecEntry {
            attr: U32::new(e.attr),
            bit: U32::new(e.bit),
        })
    }

    /// Rebuilds the vector from its persisted form, re-validating bounds
    /// so a corrupt `.info` file fails here rather than as a bad index
    /// during hashing.
    pub fn from_disk(raw: &[ChVecEntry; MAX_CHOICE_BITS], nattrs: u32) -> Result<Self> {
        let mut entries = [ChoiceBit { attr: 0, bit: 0 }; MAX_CHOICE_BITS];
        for (i, e) in raw.iter().enumerate() {
            let attr = e.attr.get();
            let bit = e.bit.get();
            ensure!(
                attr < nattrs && (bit as usize) < HASH_BITS,
                "corrupt choice vector entry {}: attr={} bit={}",
                i,
                attr,
                bit
            );
            entries[i] = ChoiceBit { attr, bit };
        }
        Ok(Self { entries })
    }
}

impl fmt::Display for ChoiceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", e.attr, e.bit)?;
        }
        Ok(())
    }
}
