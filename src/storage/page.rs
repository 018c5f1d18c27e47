//! # Slotted Tuple Pages
//!
//! Every page in the data and overflow files is exactly [`PAGE_SIZE`]
//! bytes: a 12-byte header followed by the body. The body is a packed
//! stream of NUL-terminated tuple strings filling from the front; the
//! unused tail is zero, so the first zero-length string a reader meets is
//! the end-of-data sentinel.
//!
//! ## Page Header Layout (12 bytes)
//!
//! ```text
//! Offset  Size  Field        Description
//! ------  ----  -----------  ----------------------------------------
//! 0       4     ntuples      Number of tuples stored in the body
//! 4       4     free_offset  Bytes of body consumed (next append point)
//! 8       4     ovflow_next  Next overflow page ID, or NO_PAGE
//! ```
//!
//! All fields are little-endian; `PageHeader` is the zerocopy view used
//! to read and update the header in place.
//!
//! ## Buffer Model
//!
//! A [`Page`] is a detached in-memory copy of a disk page. Reading a page
//! copies it off disk; mutations touch only the buffer and must be
//! written back explicitly through the paged file. Nothing aliases a page
//! buffer, which keeps the write-back points easy to see in the relation
//! code.

use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{NO_PAGE, PAGE_BODY_SIZE, PAGE_HEADER_SIZE, PAGE_SIZE};

use super::PageId;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct PageHeader {
    ntuples: U32,
    free_offset: U32,
    ovflow_next: U32,
}

const _: () = assert!(std::mem::size_of::<PageHeader>() == PAGE_HEADER_SIZE);

/// An in-memory copy of one disk page.
#[derive(Clone, Debug)]
pub struct Page {
    buf: [u8; PAGE_SIZE],
}

impl Page {
    /// An empty page: no tuples, no overflow link.
    pub fn new() -> Self {
        let mut page = Self {
            buf: [0u8; PAGE_SIZE],
        };
        page.header_mut().ovflow_next = U32::new(NO_PAGE);
        page
    }

    pub(crate) fn from_buf(buf: [u8; PAGE_SIZE]) -> Self {
        Self { buf }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.buf
    }

    fn header(&self) -> &PageHeader {
        PageHeader::ref_from_bytes(&self.buf[..PAGE_HEADER_SIZE])
            .expect("page header layout is pinned by a compile-time assertion")
    }

    fn header_mut(&mut self) -> &mut PageHeader {
        PageHeader::mut_from_bytes(&mut self.buf[..PAGE_HEADER_SIZE])
            .expect("page header layout is pinned by a compile-time assertion")
    }

    pub fn ntuples(&self) -> u32 {
        self.header().ntuples.get()
    }

    pub fn free_offset(&self) -> u32 {
        self.header().free_offset.get()
    }

    /// Bytes still available for tuples in the body.
    pub fn free_space(&self) -> usize {
        PAGE_BODY_SIZE.saturating_sub(self.free_offset() as usize)
    }

    /// The chained overflow page, if any.
    pub fn ovflow(&self) -> Option<PageId> {
        match self.header().ovflow_next.get() {
            NO_PAGE => None,
            id => Some(id),
        }
    }

    pub fn set_ovflow(&mut self, next: Option<PageId>) {
        self.header_mut().ovflow_next = U32::new(next.unwrap_or(NO_PAGE));
    }

    /// Appends `tuple` plus its NUL terminator at `free_offset`.
    /// Returns false, leaving the page unchanged, if it does not fit.
    pub fn add_tuple(&mut self, tuple: &str) -> bool {
        debug_assert!(!tuple.is_empty(), "empty tuple would forge the end sentinel");
        let offset = self.free_offset() as usize;
        let needed = tuple.len() + 1;
        if offset + needed > PAGE_BODY_SIZE {
            return false;
        }
        let start = PAGE_HEADER_SIZE + offset;
        self.buf[start..start + tuple.len()].copy_from_slice(tuple.as_bytes());
        self.buf[start + tuple.len()] = 0;
        let header = self.header_mut();
        header.ntuples = U32::new(header.ntuples.get() + 1);
        header.free_offset = U32::new((offset + needed) as u32);
        true
    }

    /// The tuples stored in this page, in insertion order.
    pub fn tuples(&self) -> PageTuples<'_> {
        self.tuples_from(0)
    }

    /// The tuples from byte offset `offset` of the body onwards; `offset`
    /// must sit on a tuple boundary. Scan cursors use this to resume a
    /// page mid-way.
    pub fn tuples_from(&self, offset: usize) -> PageTuples<'_> {
        PageTuples {
            body: &self.buf[PAGE_HEADER_SIZE..],
            offset,
            end: self.free_offset() as usize,
        }
    }

    /// Clears the tuple body but keeps the overflow link; used when a
    /// split redistributes a bucket into its existing chain.
    pub fn reset_keep_ovflow(&mut self) {
        let next = self.header().ovflow_next;
        self.buf = [0u8; PAGE_SIZE];
        let header = self.header_mut();
        header.ovflow_next = next;
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy walk of a page body's NUL-terminated tuple stream.
pub struct PageTuples<'a> {
    body: &'a [u8],
    offset: usize,
    end: usize,
}

impl PageTuples<'_> {
    /// Body offset just past the last tuple yielded; a valid argument for
    /// [`Page::tuples_from`].
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for PageTuples<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.offset >= self.end {
            return None;
        }
        let rest = &self.body[self.offset..self.end];
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.offset += len + 1;
        // tuples are written from &str, so non-UTF-8 means corruption;
        // treat it like the end sentinel
        std::str::from_utf8(&rest[..len]).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_page_is_empty_with_no_overflow() {
        let page = Page::new();
        assert_eq!(page.ntuples(), 0);
        assert_eq!(page.free_offset(), 0);
        assert_eq!(page.free_space(), PAGE_BODY_SIZE);
        assert_eq!(page.ovflow(), None);
        assert_eq!(page.tuples().count(), 0);
    }

    #[test]
    fn add_tuple_packs_back_to_back() {
        let mut page = Page::new();
        assert!(page.add_tuple("10,alice"));
        assert!(page.add_tuple("11,bob"));
        assert_eq!(page.ntuples(), 2);
        assert_eq!(
            page.free_offset() as usize,
            "10,alice".len() + 1 + "11,bob".len() + 1
        );
        let tuples: Vec<&str> = page.tuples().collect();
        assert_eq!(tuples, vec!["10,alice", "11,bob"]);
    }

    #[test]
    fn add_tuple_refuses_when_full_and_leaves_page_unchanged() {
        let mut page = Page::new();
        let filler = "x".repeat(PAGE_BODY_SIZE - 1);
        assert!(page.add_tuple(&filler));
        let before = page.free_offset();
        assert!(!page.add_tuple("y"));
        assert_eq!(page.free_offset(), before);
        assert_eq!(page.ntuples(), 1);
    }

    #[test]
    fn fit_boundary_is_exact() {
        // a tuple fits iff len + 1 <= free bytes
        let mut page = Page::new();
        let exact = "x".repeat(PAGE_BODY_SIZE - 1);
        assert!(page.add_tuple(&exact));
        assert_eq!(page.free_space(), 0);

        let mut page = Page::new();
        let too_big = "x".repeat(PAGE_BODY_SIZE);
        assert!(!page.add_tuple(&too_big));
    }

    #[test]
    fn ovflow_link_round_trips() {
        let mut page = Page::new();
        page.set_ovflow(Some(7));
        assert_eq!(page.ovflow(), Some(7));
        page.set_ovflow(None);
        assert_eq!(page.ovflow(), None);
    }

    #[test]
    fn reset_keep_ovflow_clears_tuples_but_not_the_link() {
        let mut page = Page::new();
        page.add_tuple("a,b");
        page.set_ovflow(Some(3));
        page.reset_keep_ovflow();
        assert_eq!(page.ntuples(), 0);
        assert_eq!(page.free_offset(), 0);
        assert_eq!(page.tuples().count(), 0);
        assert_eq!(page.ovflow(), Some(3));
    }

    #[test]
    fn tuple_iteration_stops_at_sentinel() {
        let mut page = Page::new();
        page.add_tuple("one,1");
        page.add_tuple("two,2");
        page.add_tuple("three,3");
        let tuples: Vec<&str> = page.tuples().collect();
        assert_eq!(tuples, vec!["one,1", "two,2", "three,3"]);
    }

    #[test]
    fn disk_image_round_trips() {
        let mut page = Page::new();
        page.add_tuple("42,claret");
        page.set_ovflow(Some(9));
        let copy = Page::from_buf(*page.as_bytes());
        assert_eq!(copy.ntuples(), 1);
        assert_eq!(copy.ovflow(), Some(9));
        assert_eq!(copy.tuples().collect::<Vec<_>>(), vec!["42,claret"]);
    }
}
