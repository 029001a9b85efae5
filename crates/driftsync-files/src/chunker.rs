//! Chunk readers and writers with seek support.
//!
//! The reader serves the sending side: open once, then read any chunk by
//! position. The writer serves the receiving side: preallocate the target
//! to its final size, then write chunks at their absolute offsets in
//! whatever order they arrive.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use driftsync_core::CHUNK_SIZE;

use crate::error::FilesError;

/// Positional chunk reader over a source file
pub struct ChunkReader {
    file: File,
    size: u64,
}

impl ChunkReader {
    /// Open a source file for chunked reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or stat'd.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FilesError> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }

    /// Source file size in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Total number of chunks
    #[must_use]
    pub fn total_chunks(&self) -> u64 {
        self.size.div_ceil(CHUNK_SIZE)
    }

    /// Read the chunk at `position`.
    ///
    /// Every chunk is `CHUNK_SIZE` bytes except the final one, which holds
    /// the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::PositionOutOfRange`] for positions past the
    /// end of the file, or an I/O error if seeking or reading fails.
    pub fn read_chunk(&mut self, position: u64) -> Result<Vec<u8>, FilesError> {
        if position >= self.total_chunks() {
            return Err(FilesError::PositionOutOfRange {
                position,
                total_chunks: self.total_chunks(),
            });
        }

        let offset = position * CHUNK_SIZE;
        let len = (self.size - offset).min(CHUNK_SIZE) as usize;
        let mut buffer = vec![0u8; len];

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buffer)?;

        Ok(buffer)
    }
}

/// Offset-addressed chunk writer over a target file
pub struct ChunkWriter {
    file: File,
}

impl ChunkWriter {
    /// Create a fresh target, preallocated to exactly `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or truncated.
    pub fn create<P: AsRef<Path>>(path: P, size: u64) -> Result<Self, FilesError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(size)?;
        Ok(Self { file })
    }

    /// Open an existing, partially written target without truncating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self, FilesError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self { file })
    }

    /// Write a chunk at byte offset `position * CHUNK_SIZE`.
    ///
    /// # Errors
    ///
    /// Returns an error if seeking or writing fails.
    pub fn write_chunk(&mut self, position: u64, data: &[u8]) -> Result<(), FilesError> {
        self.file.seek(SeekFrom::Start(position * CHUNK_SIZE))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Flush file contents to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if syncing fails.
    pub fn sync(&mut self) -> Result<(), FilesError> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_reader_chunk_layout() {
        let mut source = NamedTempFile::new().unwrap();
        source.write_all(&vec![0x5A; 10_000_000]).unwrap();
        source.flush().unwrap();

        let mut reader = ChunkReader::open(source.path()).unwrap();
        assert_eq!(reader.total_chunks(), 3);
        assert_eq!(reader.read_chunk(0).unwrap().len(), 4_194_304);
        assert_eq!(reader.read_chunk(1).unwrap().len(), 4_194_304);
        assert_eq!(reader.read_chunk(2).unwrap().len(), 1_611_392);
    }

    #[test]
    fn test_reader_out_of_range() {
        let mut source = NamedTempFile::new().unwrap();
        source.write_all(b"tiny").unwrap();
        source.flush().unwrap();

        let mut reader = ChunkReader::open(source.path()).unwrap();
        assert!(matches!(
            reader.read_chunk(1),
            Err(FilesError::PositionOutOfRange { .. })
        ));
    }

    #[test]
    fn test_reassembly_out_of_order() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 2 + 100)).map(|i| (i % 251) as u8).collect();
        let mut source = NamedTempFile::new().unwrap();
        source.write_all(&data).unwrap();
        source.flush().unwrap();

        let mut reader = ChunkReader::open(source.path()).unwrap();
        assert_eq!(reader.total_chunks(), 3);

        let dir = tempdir().unwrap();
        let target = dir.path().join("out.bin");
        let mut writer = ChunkWriter::create(&target, data.len() as u64).unwrap();

        for position in [2, 0, 1] {
            let chunk = reader.read_chunk(position).unwrap();
            writer.write_chunk(position, &chunk).unwrap();
        }
        writer.sync().unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), data);
    }

    #[test]
    fn test_create_preallocates() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("sparse.bin");
        let mut writer = ChunkWriter::create(&target, 12_345).unwrap();
        writer.sync().unwrap();

        assert_eq!(std::fs::metadata(&target).unwrap().len(), 12_345);
    }

    #[test]
    fn test_open_existing_keeps_data() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("partial.bin");

        let mut writer = ChunkWriter::create(&target, 8).unwrap();
        writer.write_chunk(0, b"ABCDEFGH").unwrap();
        writer.sync().unwrap();
        drop(writer);

        let mut writer = ChunkWriter::open_existing(&target).unwrap();
        writer.sync().unwrap();
        drop(writer);

        assert_eq!(std::fs::read(&target).unwrap(), b"ABCDEFGH");
    }
}
