//! # Whole-Page File I/O
//!
//! A [`PagedFile`] wraps one of the relation's files (`.data` or
//! `.ovflow`) and moves fixed-size pages between disk and detached
//! [`Page`] buffers. Pages are always transferred whole: a read copies
//! `PAGE_SIZE` bytes at `id * PAGE_SIZE` into a fresh buffer, a write
//! copies a buffer back to the same place, and files only ever grow by
//! appending one initialized empty page at a time.
//!
//! The file size is therefore always a multiple of the page size, which
//! `open` verifies before trusting the page count derived from it.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use eyre::{ensure, Result, WrapErr};

use crate::config::PAGE_SIZE;

use super::page::Page;

/// Index of a page within one paged file.
pub type PageId = u32;

#[derive(Debug)]
pub struct PagedFile {
    file: File,
    npages: u32,
    path: PathBuf,
}

impl PagedFile {
    /// Creates (or truncates) the file with zero pages.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .wrap_err_with(|| format!("failed to create page file '{}'", path.display()))?;
        Ok(Self {
            file,
            npages: 0,
            path: path.to_path_buf(),
        })
    }

    /// Opens an existing file, read-only or read-write.
    pub fn open<P: AsRef<Path>>(path: P, writable: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .wrap_err_with(|| format!("failed to open page file '{}'", path.display()))?;
        let size = file
            .metadata()
            .wrap_err_with(|| format!("failed to stat '{}'", path.display()))?
            .len();
        ensure!(
            size % PAGE_SIZE as u64 == 0,
            "page file '{}' size {} is not a multiple of page size {}",
            path.display(),
            size,
            PAGE_SIZE
        );
        Ok(Self {
            file,
            npages: (size / PAGE_SIZE as u64) as u32,
            path: path.to_path_buf(),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.npages
    }

    /// Reads the whole page `id` into a fresh buffer.
    pub fn read_page(&mut self, id: PageId) -> Result<Page> {
        ensure!(
            id < self.npages,
            "page {} out of bounds in '{}' (page count {})",
            id,
            self.path.display(),
            self.npages
        );
        let mut buf = [0u8; PAGE_SIZE];
        self.file
            .seek(SeekFrom::Start(id as u64 * PAGE_SIZE as u64))
            .wrap_err_with(|| format!("failed to seek to page {} in '{}'", id, self.path.display()))?;
        self.file
            .read_exact(&mut buf)
            .wrap_err_with(|| format!("failed to read page {} from '{}'", id, self.path.display()))?;
        Ok(Page::from_buf(buf))
    }

    /// Writes the whole page buffer back at `id`.
    pub fn write_page(&mut self, id: PageId, page: &Page) -> Result<()> {
        ensure!(
            id < self.npages,
            "page {} out of bounds in '{}' (page count {})",
            id,
            self.path.display(),
            self.npages
        );
        self.file
            .seek(SeekFrom::Start(id as u64 * PAGE_SIZE as u64))
            .wrap_err_with(|| format!("failed to seek to page {} in '{}'", id, self.path.display()))?;
        self.file
            .write_all(page.as_bytes())
            .wrap_err_with(|| format!("failed to write page {} to '{}'", id, self.path.display()))?;
        Ok(())
    }

    /// Appends one empty page and returns its ID. IDs are dense: the new
    /// page always lands at the current page count.
    pub fn append_page(&mut self) -> Result<PageId> {
        let id = self.npages;
        self.file
            .seek(SeekFrom::Start(id as u64 * PAGE_SIZE as u64))
            .wrap_err_with(|| {
                format!("failed to seek to new page {} in '{}'", id, self.path.display())
            })?;
        self.file
            .write_all(Page::new().as_bytes())
            .wrap_err_with(|| format!("failed to append page {} to '{}'", id, self.path.display()))?;
        self.npages += 1;
        Ok(id)
    }
}
