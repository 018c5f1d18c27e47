//! # Relations
//!
//! A relation is the engine's unit of storage: a fixed-schema set of
//! tuples spread over buckets, backed by three files that share a name
//! stem:
//!
//! ```text
//! <name>.info     linear-hash state + choice vector (written on close)
//! <name>.data     primary pages, one per bucket, dense IDs [0, npages)
//! <name>.ovflow   overflow pages, allocated append-only, chained by ID
//! ```
//!
//! ## Insertion Data Flow
//!
//! ```text
//! tuple ──> per-attribute hashes ──> choice vector ──> combined hash
//!                                                          │
//!                       bucket_of(combined, depth, sp) <───┘
//!                                │
//!              primary page ──> overflow chain walk ──> append to chain
//!                                │
//!              counter reaches capacity? ──> split bucket `sp`
//! ```
//!
//! ## Linear-Hash State
//!
//! `(depth, sp, npages, ntups)` always satisfy `npages == 2^depth + sp`
//! and `0 <= sp < 2^depth`. Buckets below `sp` have been split this round
//! and address with `depth + 1` bits; the rest use `depth` bits. One
//! bucket is split per `capacity` insertions, where `capacity` is derived
//! from the page body size and the attribute count. The split counter is
//! deliberately not persisted: a reopened relation starts a fresh count,
//! which keeps the trigger well-defined across any number of sessions.
//!
//! ## Durability Model
//!
//! Page writes happen before `insert` returns, but the `.info` state is
//! flushed only by [`Relation::close`]. A process that exits early loses
//! the in-memory counters and keeps the previously persisted state; no
//! recovery pass is attempted on open.

mod info;
mod stats;

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use eyre::{ensure, Result, WrapErr};
use zerocopy::little_endian::U32;

use crate::bits::{low_bits, Bits};
use crate::chvec::ChoiceVector;
use crate::config::{
    AVG_ATTR_BYTES, DATA_FILE_EXTENSION, HASH_BITS, INFO_FILE_EXTENSION, OVFLOW_FILE_EXTENSION,
    PAGE_BODY_SIZE,
};
use crate::query::PartialScan;
use crate::storage::{PageId, PagedFile};
use crate::tuple::{Pattern, Tuple};

use info::InfoHeader;
pub use stats::{BucketStat, PageStat, RelationStats};

/// How a relation was opened. Only write-mode relations may insert, and
/// only they rewrite the `.info` file on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// An open relation: the three file handles plus the in-memory
/// linear-hash state.
#[derive(Debug)]
pub struct Relation {
    mode: AccessMode,
    nattrs: u32,
    depth: u32,
    sp: u32,
    npages: u32,
    ntups: u32,
    inserts_since_split: u32,
    cv: ChoiceVector,
    info: File,
    data: PagedFile,
    ovflow: PagedFile,
}

fn file_path(name: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", name, extension))
}

impl Relation {
    /// Creates a new relation: parses and validates the choice vector,
    /// then lays down the three files with `npages` empty primary pages.
    /// Nothing is created on disk if validation fails.
    pub fn create(name: &str, nattrs: u32, npages: u32, depth: u32, chvec_spec: &str) -> Result<()> {
        ensure!(nattrs > 0, "a relation needs at least one attribute");
        ensure!(
            (depth as usize) < HASH_BITS,
            "depth {} exceeds the hash width",
            depth
        );
        ensure!(
            npages == 1 << depth,
            "initial page count {} must be 2^depth (= {})",
            npages,
            1u32 << depth
        );
        ensure!(
            !Self::exists(name),
            "relation '{}' already exists",
            name
        );
        let cv = ChoiceVector::parse(nattrs, chvec_spec)?;

        let mut info = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(file_path(name, INFO_FILE_EXTENSION))
            .wrap_err_with(|| format!("failed to create info file for '{}'", name))?;
        let mut data = PagedFile::create(file_path(name, DATA_FILE_EXTENSION))?;
        PagedFile::create(file_path(name, OVFLOW_FILE_EXTENSION))?;

        for _ in 0..npages {
            data.append_page()?;
        }

        let header = InfoHeader {
            nattrs: U32::new(nattrs),
            depth: U32::new(depth),
            sp: U32::new(0),
            npages: U32::new(npages),
            ntups: U32::new(0),
        };
        info::write_info(&mut info, &header, &cv.to_disk())
    }

    /// Whether a relation of this name exists (probes the `.info` file).
    pub fn exists(name: &str) -> bool {
        file_path(name, INFO_FILE_EXTENSION).exists()
    }

    /// Removes the three files of a relation.
    pub fn remove(name: &str) -> Result<()> {
        ensure!(Self::exists(name), "relation '{}' does not exist", name);
        for ext in [INFO_FILE_EXTENSION, DATA_FILE_EXTENSION, OVFLOW_FILE_EXTENSION] {
            let path = file_path(name, ext);
            std::fs::remove_file(&path)
                .wrap_err_with(|| format!("failed to remove '{}'", path.display()))?;
        }
        Ok(())
    }

    /// Opens an existing relation and validates its persisted state.
    pub fn open(name: &str, mode: AccessMode) -> Result<Self> {
        let writable = mode == AccessMode::ReadWrite;
        let mut info = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(file_path(name, INFO_FILE_EXTENSION))
            .wrap_err_with(|| format!("failed to open relation '{}'", name))?;
        let data = PagedFile::open(file_path(name, DATA_FILE_EXTENSION), writable)?;
        let ovflow = PagedFile::open(file_path(name, OVFLOW_FILE_EXTENSION), writable)?;

        let (header, raw_cv) = info::read_info(&mut info)?;
        let nattrs = header.nattrs.get();
        let depth = header.depth.get();
        let sp = header.sp.get();
        let npages = header.npages.get();

        ensure!(nattrs > 0, "corrupt info file: zero attributes");
        ensure!(
            (depth as usize) < HASH_BITS && sp < (1 << depth),
            "corrupt info file: depth={} sp={}",
            depth,
            sp
        );
        ensure!(
            npages == (1 << depth) + sp,
            "corrupt info file: npages={} but depth={} sp={}",
            npages,
            depth,
            sp
        );
        ensure!(
            data.page_count() == npages,
            "data file has {} pages but info records {}",
            data.page_count(),
            npages
        );
        let cv = ChoiceVector::from_disk(&raw_cv, nattrs)?;

        Ok(Self {
            mode,
            nattrs,
            depth,
            sp,
            npages,
            ntups: header.ntups.get(),
            inserts_since_split: 0,
            cv,
            info,
            data,
            ovflow,
        })
    }

    /// Flushes the linear-hash state to the `.info` file (write mode
    /// only) and releases the handles.
    pub fn close(mut self) -> Result<()> {
        if self.mode == AccessMode::ReadWrite {
            let header = InfoHeader {
                nattrs: U32::new(self.nattrs),
                depth: U32::new(self.depth),
                sp: U32::new(self.sp),
                npages: U32::new(self.npages),
                ntups: U32::new(self.ntups),
            };
            info::write_info(&mut self.info, &header, &self.cv.to_disk())?;
        }
        Ok(())
    }

    pub fn nattrs(&self) -> u32 {
        self.nattrs
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn split_pointer(&self) -> u32 {
        self.sp
    }

    pub fn page_count(&self) -> u32 {
        self.npages
    }

    pub fn tuple_count(&self) -> u32 {
        self.ntups
    }

    pub fn choice_vector(&self) -> &ChoiceVector {
        &self.cv
    }

    /// Insertions between consecutive bucket splits, derived from the
    /// page body size and a heuristic average attribute width.
    pub fn capacity(&self) -> u32 {
        (PAGE_BODY_SIZE as u32 / (AVG_ATTR_BYTES * self.nattrs)).max(1)
    }

    /// The combined hash of a tuple under this relation's choice vector.
    pub fn combined_hash(&self, tuple: &Tuple) -> Bits {
        self.cv.combined_hash(&tuple.values())
    }

    /// The bucket a combined hash addresses at the current `(depth, sp)`.
    /// Buckets below the split pointer were split this round and use one
    /// extra address bit.
    pub fn bucket_of(&self, combined: Bits) -> PageId {
        let p = low_bits(combined, self.depth);
        if p < self.sp {
            low_bits(combined, self.depth + 1)
        } else {
            p
        }
    }

    /// Inserts a tuple, returning the ID of the primary bucket it landed
    /// in (the tuple itself may sit in that bucket's overflow chain).
    /// Runs the pending bucket split before returning when this insert
    /// crosses the capacity threshold.
    pub fn insert(&mut self, tuple: &Tuple) -> Result<PageId> {
        ensure!(
            self.mode == AccessMode::ReadWrite,
            "relation is open read-only"
        );
        ensure!(
            tuple.values().len() == self.nattrs as usize,
            "tuple '{}' has {} attributes, relation has {}",
            tuple,
            tuple.values().len(),
            self.nattrs
        );
        ensure!(
            tuple.stored_len() <= PAGE_BODY_SIZE,
            "tuple of {} bytes cannot fit a page body of {} bytes",
            tuple.stored_len(),
            PAGE_BODY_SIZE
        );

        let bucket = self.bucket_of(self.combined_hash(tuple));
        self.insert_into_bucket(bucket, tuple.as_str())?;
        self.ntups += 1;
        self.inserts_since_split += 1;

        if self.inserts_since_split >= self.capacity() {
            self.split()?;
            self.inserts_since_split = 0;
        }
        Ok(bucket)
    }

    /// Walks a bucket from its primary page through the overflow chain,
    /// appending the tuple to the first page with room; extends the chain
    /// with a fresh overflow page when every page is full.
    fn insert_into_bucket(&mut self, primary: PageId, tuple: &str) -> Result<()> {
        let mut page = self.data.read_page(primary)?;
        if page.add_tuple(tuple) {
            return self.data.write_page(primary, &page);
        }

        let Some(first) = page.ovflow() else {
            // start the chain: link first, then fill the new page
            let new_id = self.ovflow.append_page()?;
            page.set_ovflow(Some(new_id));
            self.data.write_page(primary, &page)?;
            let mut new_page = self.ovflow.read_page(new_id)?;
            ensure!(
                new_page.add_tuple(tuple),
                "tuple does not fit in an empty overflow page"
            );
            return self.ovflow.write_page(new_id, &new_page);
        };

        let mut id = first;
        let mut page = self.ovflow.read_page(id)?;
        loop {
            if page.add_tuple(tuple) {
                return self.ovflow.write_page(id, &page);
            }
            match page.ovflow() {
                Some(next) => {
                    id = next;
                    page = self.ovflow.read_page(next)?;
                }
                None => break,
            }
        }

        // every page in the chain is full; extend it
        let new_id = self.ovflow.append_page()?;
        let mut new_page = self.ovflow.read_page(new_id)?;
        ensure!(
            new_page.add_tuple(tuple),
            "tuple does not fit in an empty overflow page"
        );
        self.ovflow.write_page(new_id, &new_page)?;
        page.set_ovflow(Some(new_id));
        self.ovflow.write_page(id, &page)
    }

    /// Splits bucket `sp` into `sp` and `sp + 2^depth`: captures the old
    /// bucket's tuples, resets its pages in place (links preserved so the
    /// chain can be refilled), and redistributes every tuple with one
    /// extra address bit. Reinsertions do not touch `ntups` or the split
    /// counter, so a split never nests.
    fn split(&mut self) -> Result<()> {
        ensure!(
            (self.depth as usize + 1) < HASH_BITS,
            "relation depth exhausted"
        );
        let oldp = self.sp;
        let newp = self.sp + (1 << self.depth);
        let appended = self.data.append_page()?;
        ensure!(
            appended == newp,
            "data file out of step with linear-hash state: appended page {} but expected {}",
            appended,
            newp
        );

        // capture the whole bucket into memory, resetting each page in
        // place as it is read; the links stay intact so the chain can be
        // refilled during redistribution
        let mut primary = self.data.read_page(oldp)?;
        let mut tuples: Vec<String> = primary.tuples().map(String::from).collect();
        let mut chain: Vec<PageId> = Vec::new();
        let mut next = primary.ovflow();
        while let Some(id) = next {
            ensure!(
                chain.len() < self.ovflow.page_count() as usize,
                "overflow chain of bucket {} contains a cycle",
                oldp
            );
            let mut page = self.ovflow.read_page(id)?;
            tuples.extend(page.tuples().map(String::from));
            next = page.ovflow();
            page.reset_keep_ovflow();
            self.ovflow.write_page(id, &page)?;
            chain.push(id);
        }
        primary.reset_keep_ovflow();
        self.data.write_page(oldp, &primary)?;

        // redistribute with depth + 1 address bits
        for tuple in &tuples {
            let vals: Vec<&str> = tuple.split(',').collect();
            let dest = low_bits(self.cv.combined_hash(&vals), self.depth + 1);
            debug_assert!(dest == oldp || dest == newp);
            self.insert_into_bucket(dest, tuple)?;
        }

        // cut the old chain after the last page still holding tuples;
        // later pages become unreferenced and stay on disk
        self.trim_chain(oldp, &chain)?;

        self.npages += 1;
        self.sp += 1;
        if self.sp == 1 << self.depth {
            self.sp = 0;
            self.depth += 1;
        }
        Ok(())
    }

    fn trim_chain(&mut self, primary_id: PageId, chain: &[PageId]) -> Result<()> {
        let mut last_used = None;
        for &id in chain {
            if self.ovflow.read_page(id)?.ntuples() > 0 {
                last_used = Some(id);
            }
        }
        match last_used {
            None => {
                let mut primary = self.data.read_page(primary_id)?;
                if primary.ovflow().is_some() {
                    primary.set_ovflow(None);
                    self.data.write_page(primary_id, &primary)?;
                }
            }
            Some(last) => {
                let mut page = self.ovflow.read_page(last)?;
                if page.ovflow().is_some() {
                    page.set_ovflow(None);
                    self.ovflow.write_page(last, &page)?;
                }
            }
        }
        Ok(())
    }

    /// Starts a partial-match scan for `pattern`.
    pub fn select(&mut self, pattern: &Pattern) -> Result<PartialScan<'_>> {
        ensure!(
            pattern.fields().len() == self.nattrs as usize,
            "pattern '{}' has {} attributes, relation has {}",
            pattern,
            pattern.fields().len(),
            self.nattrs
        );
        PartialScan::new(self, pattern.clone())
    }

    /// Gathers global counters and a dump of every bucket's chain.
    pub fn stats(&mut self) -> Result<RelationStats> {
        let mut buckets = Vec::with_capacity(self.npages as usize);
        for bucket in 0..self.npages {
            let mut pages = Vec::new();
            let primary = self.data.read_page(bucket)?;
            pages.push(PageStat {
                id: bucket,
                is_ovflow: false,
                ntuples: primary.ntuples(),
                free_bytes: primary.free_space(),
                ovflow: primary.ovflow(),
            });
            let mut next = primary.ovflow();
            while let Some(id) = next {
                ensure!(
                    pages.len() <= self.ovflow.page_count() as usize,
                    "overflow chain of bucket {} contains a cycle",
                    bucket
                );
                let page = self.ovflow.read_page(id)?;
                pages.push(PageStat {
                    id,
                    is_ovflow: true,
                    ntuples: page.ntuples(),
                    free_bytes: page.free_space(),
                    ovflow: page.ovflow(),
                });
                next = page.ovflow();
            }
            buckets.push(BucketStat { bucket, pages });
        }
        Ok(RelationStats {
            nattrs: self.nattrs,
            npages: self.npages,
            ntups: self.ntups,
            depth: self.depth,
            sp: self.sp,
            chvec: self.cv.to_string(),
            buckets,
        })
    }

    pub(crate) fn data_file_mut(&mut self) -> &mut PagedFile {
        &mut self.data
    }

    pub(crate) fn ovflow_file_mut(&mut self) -> &mut PagedFile {
        &mut self.ovflow
    }
}
