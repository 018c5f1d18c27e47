//! # LinHash - Multi-Attribute Linear Hashed Files
//!
//! LinHash is a single-process storage engine for fixed-schema,
//! comma-separated tuples, indexed so that a query can supply values for
//! *any subset* of the attributes. Instead of hashing one key, the
//! engine interleaves bits drawn from the hash of every attribute (the
//! *choice vector*) into one combined bucket address. A partial-match
//! query then pins the address bits its known attributes feed and scans
//! only the buckets consistent with them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use linhash::{AccessMode, Pattern, Relation, Tuple};
//!
//! Relation::create("./emps", 3, 1, 0, "0:0,1:0,2:0")?;
//!
//! let mut rel = Relation::open("./emps", AccessMode::ReadWrite)?;
//! rel.insert(&Tuple::parse(3, "1001,smith,dev")?)?;
//! rel.insert(&Tuple::parse(3, "1002,jones,ops")?)?;
//!
//! let pattern = Pattern::parse(3, "?,smith,?")?;
//! let mut scan = rel.select(&pattern)?;
//! while let Some(tuple) = scan.next_tuple()? {
//!     println!("{}", tuple);
//! }
//! rel.close()?;
//! ```
//!
//! ## Architecture
//!
//! The engine is four layers, leaves first:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        CLI (create/insert/select/       │
//! │              stats/drop)                │
//! ├─────────────────────────────────────────┤
//! │  Query: bit classification, candidate   │
//! │  buckets, partial-match scan cursor     │
//! ├─────────────────────────────────────────┤
//! │  Relation: linear-hash state (d, sp),   │
//! │  insert with incremental bucket split   │
//! ├─────────────────────────────────────────┤
//! │  Storage: fixed-size tuple pages,       │
//! │  whole-page file I/O, overflow chains   │
//! ├─────────────────────────────────────────┤
//! │  Bits / Hash / Choice vector            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## File Layout
//!
//! Each relation is three flat files sharing a name stem:
//!
//! ```text
//! emps.info      linear-hash counters + choice vector
//! emps.data      primary pages, one per bucket
//! emps.ovflow    overflow pages, chained per bucket by page ID
//! ```
//!
//! ## Growth
//!
//! The file grows one bucket at a time: every `capacity` insertions the
//! bucket at the split pointer is rehashed with one extra address bit
//! and redistributed over itself and its new twin. Queries stay correct
//! throughout because addressing consults the split pointer.
//!
//! ## Module Overview
//!
//! - [`bits`]: low-bit extraction and single-bit tests, the only address
//!   arithmetic the engine permits itself
//! - [`hash`]: deterministic 32-bit attribute hashing
//! - [`chvec`]: the choice vector, textual and persisted forms
//! - [`tuple`]: tuples and query patterns
//! - [`storage`]: tuple pages and whole-page file I/O
//! - [`relation`]: relation lifecycle, insertion, splitting, stats
//! - [`query`]: candidate-bucket enumeration and the scan cursor
//! - [`cli`]: the command-line surface

pub mod bits;
pub mod chvec;
pub mod cli;
pub mod config;
pub mod hash;
pub mod query;
pub mod relation;
pub mod storage;
pub mod tuple;

pub use chvec::ChoiceVector;
pub use query::PartialScan;
pub use relation::{AccessMode, Relation, RelationStats};
pub use tuple::{Pattern, Tuple};
