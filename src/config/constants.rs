//! # LinHash Configuration Constants
//!
//! This module centralizes the engine's layout constants. Several of them
//! are derived from each other; co-locating them keeps the derivations
//! visible and lets compile-time assertions pin the relationships.
//!
//! ## Dependency Graph
//!
//! ```text
//! PAGE_SIZE (1024 bytes)
//!       │
//!       ├─> PAGE_HEADER_SIZE (12 bytes: ntuples, free_offset, ovflow_next)
//!       │
//!       └─> PAGE_BODY_SIZE (derived: PAGE_SIZE - PAGE_HEADER_SIZE)
//!             │
//!             └─> split capacity = PAGE_BODY_SIZE / (AVG_ATTR_BYTES * nattrs)
//!                   One bucket split is performed per this many insertions.
//!
//! HASH_BITS (32)
//!       │
//!       └─> MAX_CHOICE_BITS (32, one choice-vector entry per hash bit)
//! ```
//!
//! ## Critical Invariants
//!
//! 1. `PAGE_BODY_SIZE == PAGE_SIZE - PAGE_HEADER_SIZE` (derived correctly)
//! 2. `MAX_CHOICE_BITS <= HASH_BITS` (a bucket address never needs more
//!    bits than a combined hash has)
//! 3. `PAGE_HEADER_SIZE` matches the on-disk `PageHeader` struct; the
//!    storage module pins this with its own assertion.

/// Size of each data and overflow page in bytes.
/// This is the fundamental unit of disk I/O: pages are always read and
/// written whole.
pub const PAGE_SIZE: usize = 1024;

/// Size of the page header in bytes.
/// Every page begins with this header: tuple count, free offset, overflow link.
pub const PAGE_HEADER_SIZE: usize = 12;

/// Usable tuple space in a page after the header.
pub const PAGE_BODY_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE;

/// Width of an attribute hash and of a combined hash, in bits.
pub const HASH_BITS: usize = 32;

/// Number of entries in a choice vector: one per combined-hash bit.
pub const MAX_CHOICE_BITS: usize = 32;

/// Heuristic average bytes per attribute value, used to derive the
/// insertions-per-split capacity from the page body size.
pub const AVG_ATTR_BYTES: u32 = 10;

/// Reserved page ID meaning "no page" (end of an overflow chain).
pub const NO_PAGE: u32 = u32::MAX;

/// File name extensions for the three files backing a relation.
pub const INFO_FILE_EXTENSION: &str = "info";
pub const DATA_FILE_EXTENSION: &str = "data";
pub const OVFLOW_FILE_EXTENSION: &str = "ovflow";

const _: () = assert!(
    PAGE_BODY_SIZE == PAGE_SIZE - PAGE_HEADER_SIZE,
    "PAGE_BODY_SIZE derivation mismatch"
);

const _: () = assert!(
    MAX_CHOICE_BITS <= HASH_BITS,
    "choice vector cannot draw more bits than a hash provides"
);

const _: () = assert!(
    (PAGE_SIZE as u64) < NO_PAGE as u64,
    "NO_PAGE sentinel must not collide with a real page ID"
);
