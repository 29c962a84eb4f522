//! Positional reads of the `blk?????.dat` and `rev?????.dat` files.
//!
//! Each record in these files is laid out as `magic (4) | size (4, little-endian) | payload`.
//! The block index points at the payload, so the size sits in the 4 bytes right before it.

use crate::{BlockIndexEntry, Error, Hash256, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const SIZE_PREFIX_LEN: u32 = 4;

/// Returns the name of the block file with number `file_number`.
pub fn block_file_name(file_number: i32) -> String {
    format!("blk{file_number:05}.dat")
}

/// Returns the name of the undo file with number `file_number`.
pub fn undo_file_name(file_number: i32) -> String {
    format!("rev{file_number:05}.dat")
}

/// Reads raw block and undo payloads from the `blocks` directory.
///
/// Files are opened for each read and closed before returning.
#[derive(Debug, Clone)]
pub struct BlockDataFileReader {
    blocks_dir: PathBuf,
}

impl BlockDataFileReader {
    /// Constructs a new instance of [`BlockDataFileReader`] over `blocks_dir`.
    pub fn new(blocks_dir: impl Into<PathBuf>) -> Self {
        Self {
            blocks_dir: blocks_dir.into(),
        }
    }

    pub fn blocks_dir(&self) -> &Path {
        &self.blocks_dir
    }

    /// Reads the serialized block of `entry`.
    pub fn read_block_bytes(&self, entry: &BlockIndexEntry) -> Result<Vec<u8>> {
        if !entry.status.have_data() {
            return Err(Error::MissingData(entry.hash));
        }

        let path = self.blocks_dir.join(block_file_name(entry.file_number));
        read_sized_payload(&path, entry.hash, entry.data_pos)
    }

    /// Reads the serialized undo data of `entry`.
    ///
    /// The payload excludes the checksum Bitcoin Core appends after it.
    pub fn read_undo_bytes(&self, entry: &BlockIndexEntry) -> Result<Vec<u8>> {
        if !entry.status.have_undo() {
            return Err(Error::MissingUndo(entry.hash));
        }

        let path = self.blocks_dir.join(undo_file_name(entry.file_number));
        read_sized_payload(&path, entry.hash, entry.undo_pos)
    }
}

/// Reads the serialized block of `entry` from the block files in `payload_dir`.
pub fn read_block_bytes(entry: &BlockIndexEntry, payload_dir: &Path) -> Result<Vec<u8>> {
    BlockDataFileReader::new(payload_dir).read_block_bytes(entry)
}

fn read_sized_payload(path: &Path, hash: Hash256, position: u32) -> Result<Vec<u8>> {
    let size_offset = position
        .checked_sub(SIZE_PREFIX_LEN)
        .ok_or(Error::BadDataPosition { hash, position })?;

    let mut file = File::open(path).map_err(|err| Error::io(path, err))?;

    let mut size_bytes = [0u8; SIZE_PREFIX_LEN as usize];
    read_exact_at(&mut file, path, u64::from(size_offset), &mut size_bytes)?;
    let size = u32::from_le_bytes(size_bytes);

    // The size prefix is untrusted, the buffer only grows with the bytes actually present.
    file.seek(SeekFrom::Start(u64::from(position)))
        .map_err(|err| Error::io(path, err))?;
    let mut payload = Vec::new();
    let got = (&mut file)
        .take(u64::from(size))
        .read_to_end(&mut payload)
        .map_err(|err| Error::io(path, err))?;

    if got < size as usize {
        return Err(Error::ShortRead {
            path: path.to_path_buf(),
            offset: u64::from(position),
            wanted: size as usize,
            got,
        });
    }

    tracing::trace!(
        "Read {size} bytes of {hash} at {}:{position}",
        path.display()
    );

    Ok(payload)
}

fn read_exact_at(file: &mut File, path: &Path, offset: u64, buf: &mut [u8]) -> Result<()> {
    file.seek(SeekFrom::Start(offset))
        .map_err(|err| Error::io(path, err))?;

    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(Error::io(path, err)),
        }
    }

    if filled < buf.len() {
        return Err(Error::ShortRead {
            path: path.to_path_buf(),
            offset,
            wanted: buf.len(),
            got: filled,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockStatus, ErrorKind};
    use std::io::Write;

    const REGTEST_MAGIC: [u8; 4] = [0xfa, 0xbf, 0xb5, 0xda];

    fn entry(status: u32, file_number: i32, data_pos: u32, undo_pos: u32) -> BlockIndexEntry {
        BlockIndexEntry {
            hash: Hash256::new([9; 32]),
            version: 250000,
            height: 1,
            status: BlockStatus::from(status),
            tx_count: 1,
            file_number,
            data_pos,
            undo_pos,
            block_version: 1,
            previous_hash: Hash256::all_zeros(),
            merkle_root: Hash256::all_zeros(),
            time: 0,
            bits: 0,
            nonce: 0,
        }
    }

    /// Writes `payloads` as framed records and returns the payload positions.
    fn write_records(path: &Path, payloads: &[&[u8]]) -> Vec<u32> {
        let mut file = File::create(path).unwrap();
        let mut positions = Vec::new();
        let mut offset = 0u32;
        for payload in payloads {
            file.write_all(&REGTEST_MAGIC).unwrap();
            file.write_all(&(payload.len() as u32).to_le_bytes()).unwrap();
            file.write_all(payload).unwrap();
            positions.push(offset + 8);
            offset += 8 + payload.len() as u32;
        }
        positions
    }

    #[test]
    fn test_file_names() {
        assert_eq!(block_file_name(0), "blk00000.dat");
        assert_eq!(block_file_name(123), "blk00123.dat");
        assert_eq!(undo_file_name(7), "rev00007.dat");
    }

    #[test]
    fn test_reads_exactly_the_framed_payload() {
        let dir = tempfile::tempdir().unwrap();
        let first = vec![0xab; 300];
        let second = vec![0xcd; 0x1_0203];
        let positions = write_records(&dir.path().join("blk00002.dat"), &[&first, &second]);

        let reader = BlockDataFileReader::new(dir.path());
        let data = reader
            .read_block_bytes(&entry(5 | 8, 2, positions[1], 0))
            .unwrap();
        assert_eq!(data.len(), 0x1_0203);
        assert_eq!(data, second);

        let data = read_block_bytes(&entry(5 | 8, 2, positions[0], 0), dir.path()).unwrap();
        assert_eq!(data, first);
    }

    #[test]
    fn test_reads_undo_payload() {
        let dir = tempfile::tempdir().unwrap();
        let undo = vec![0x01, 0x02, 0x03];
        let positions = write_records(&dir.path().join("rev00000.dat"), &[&undo]);

        let reader = BlockDataFileReader::new(dir.path());
        let data = reader
            .read_undo_bytes(&entry(5 | 8 | 16, 0, 8, positions[0]))
            .unwrap();
        assert_eq!(data, undo);

        let err = reader.read_undo_bytes(&entry(5 | 8, 0, 8, 0)).unwrap_err();
        assert!(matches!(err, Error::MissingUndo(_)));
    }

    #[test]
    fn test_missing_have_data_never_returns_bytes() {
        let dir = tempfile::tempdir().unwrap();
        write_records(&dir.path().join("blk00000.dat"), &[&[1, 2, 3]]);

        let err = read_block_bytes(&entry(5 | 16, 0, 8, 8), dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingData(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_block_bytes(&entry(5 | 8, 3, 8, 0), dir.path()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("blk00003.dat"));
    }

    #[test]
    fn test_truncated_payload_is_a_short_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blk00000.dat");
        let mut file = File::create(&path).unwrap();
        file.write_all(&REGTEST_MAGIC).unwrap();
        file.write_all(&100u32.to_le_bytes()).unwrap();
        file.write_all(&[0u8; 60]).unwrap();
        drop(file);

        let err = read_block_bytes(&entry(5 | 8, 0, 8, 0), dir.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::ShortRead {
                offset: 8,
                wanted: 100,
                got: 60,
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_prefix_is_a_short_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("blk00000.dat")).unwrap();
        file.write_all(&REGTEST_MAGIC).unwrap();
        file.write_all(&u32::MAX.to_le_bytes()).unwrap();
        file.write_all(&[0x5a; 16]).unwrap();
        drop(file);

        let err = read_block_bytes(&entry(5 | 8, 0, 8, 0), dir.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::ShortRead {
                offset: 8,
                wanted,
                got: 16,
                ..
            } if wanted == u32::MAX as usize
        ));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_position_before_size_prefix() {
        let dir = tempfile::tempdir().unwrap();
        write_records(&dir.path().join("blk00000.dat"), &[&[1]]);
        let err = read_block_bytes(&entry(5 | 8, 0, 2, 0), dir.path()).unwrap_err();
        assert!(matches!(err, Error::BadDataPosition { position: 2, .. }));
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
