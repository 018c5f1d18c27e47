//! # Relation Info File
//!
//! The `.info` file persists the linear-hash state between opens: a
//! 20-byte header of five little-endian `u32` counters, followed by the
//! 32 choice-vector entries. It is written in full when a write-mode
//! relation closes and read in full when a relation opens; nothing else
//! touches it, so a crash before close simply leaves the previously
//! persisted state in place.
//!
//! ```text
//! Offset  Size  Field
//! 0       4     nattrs
//! 4       4     depth
//! 8       4     sp
//! 12      4     npages
//! 16      4     ntups
//! 20      256   choice vector (32 x 8-byte attr:bit pairs)
//! ```

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use eyre::{Result, WrapErr};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::chvec::{ChVecEntry, CHVEC_ENTRY_SIZE};
use crate::config::MAX_CHOICE_BITS;

pub const INFO_HEADER_SIZE: usize = 20;
pub const INFO_FILE_SIZE: usize = INFO_HEADER_SIZE + MAX_CHOICE_BITS * CHVEC_ENTRY_SIZE;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct InfoHeader {
    pub nattrs: U32,
    pub depth: U32,
    pub sp: U32,
    pub npages: U32,
    pub ntups: U32,
}

const _: () = assert!(std::mem::size_of::<InfoHeader>() == INFO_HEADER_SIZE);
const _: () = assert!(std::mem::size_of::<[ChVecEntry; MAX_CHOICE_BITS]>() == 256);

pub fn read_info(file: &mut File) -> Result<(InfoHeader, [ChVecEntry; MAX_CHOICE_BITS])> {
    let mut buf = [0u8; INFO_FILE_SIZE];
    file.seek(SeekFrom::Start(0))
        .wrap_err("failed to seek in info file")?;
    file.read_exact(&mut buf)
        .wrap_err("failed to read relation info")?;
    let header = InfoHeader::read_from_bytes(&buf[..INFO_HEADER_SIZE])
        .map_err(|e| eyre::eyre!("failed to parse info header: {:?}", e))?;
    let chvec = <[ChVecEntry; MAX_CHOICE_BITS]>::read_from_bytes(&buf[INFO_HEADER_SIZE..])
        .map_err(|e| eyre::eyre!("failed to parse stored choice vector: {:?}", e))?;
    Ok((header, chvec))
}

pub fn write_info(
    file: &mut File,
    header: &InfoHeader,
    chvec: &[ChVecEntry; MAX_CHOICE_BITS],
) -> Result<()> {
    file.seek(SeekFrom::Start(0))
        .wrap_err("failed to seek in info file")?;
    file.write_all(header.as_bytes())
        .wrap_err("failed to write info header")?;
    file.write_all(chvec.as_bytes())
        .wrap_err("failed to write choice vector")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chvec::ChoiceVector;
    use tempfile::tempdir;

    #[test]
    fn info_round_trips_through_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.info");
        let cv = ChoiceVector::parse(3, "0:0,1:0,2:0").unwrap();
        let header = InfoHeader {
            nattrs: U32::new(3),
            depth: U32::new(2),
            sp: U32::new(1),
            npages: U32::new(5),
            ntups: U32::new(123),
        };

        let mut file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        write_info(&mut file, &header, &cv.to_disk()).unwrap();

        let (back, raw) = read_info(&mut file).unwrap();
        assert_eq!(back.nattrs.get(), 3);
        assert_eq!(back.depth.get(), 2);
        assert_eq!(back.sp.get(), 1);
        assert_eq!(back.npages.get(), 5);
        assert_eq!(back.ntups.get(), 123);
        assert_eq!(ChoiceVector::from_disk(&raw, 3).unwrap(), cv);
        assert_eq!(file.metadata().unwrap().len(), INFO_FILE_SIZE as u64);
    }

    #[test]
    fn read_fails_on_truncated_info() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.info");
        std::fs::write(&path, [0u8; 10]).unwrap();
        let mut file = File::options().read(true).open(&path).unwrap();
        assert!(read_info(&mut file).is_err());
    }
}
