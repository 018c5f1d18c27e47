//! Relation statistics: global counters plus a per-bucket dump of every
//! page in every overflow chain. This is the engine's introspection
//! surface; the CLI `stats` command prints the [`Display`] form.

use std::fmt;

use crate::storage::PageId;

/// One page of a bucket: the primary data page or an overflow page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStat {
    pub id: PageId,
    pub is_ovflow: bool,
    pub ntuples: u32,
    pub free_bytes: usize,
    pub ovflow: Option<PageId>,
}

/// A bucket's primary page followed by its chain, in chain order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketStat {
    pub bucket: PageId,
    pub pages: Vec<PageStat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationStats {
    pub nattrs: u32,
    pub npages: u32,
    pub ntups: u32,
    pub depth: u32,
    pub sp: u32,
    pub chvec: String,
    pub buckets: Vec<BucketStat>,
}

impl fmt::Display for RelationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Global Info:")?;
        writeln!(
            f,
            "#attrs:{}  #pages:{}  #tuples:{}  d:{}  sp:{}",
            self.nattrs, self.npages, self.ntups, self.depth, self.sp
        )?;
        writeln!(f, "Choice vector")?;
        writeln!(f, "{}", self.chvec)?;
        writeln!(f, "Bucket Info:")?;
        writeln!(f, "{:<4} {}", "#", "Info on pages in bucket")?;
        writeln!(f, "{:<4} {}", "", "(pageID,#tuples,freebytes,ovflow)")?;
        for bucket in &self.buckets {
            write!(f, "[{:2}] ", bucket.bucket)?;
            for (i, page) in bucket.pages.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                let kind = if page.is_ovflow { "ov" } else { "d" };
                let next = page.ovflow.map_or(-1, |id| id as i64);
                write!(
                    f,
                    "({}{},{},{},{})",
                    kind, page.id, page.ntuples, page.free_bytes, next
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
