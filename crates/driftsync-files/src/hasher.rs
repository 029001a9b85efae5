//! Per-chunk content hashing.
//!
//! Files are hashed in chunk-size-aligned blocks; each block gets an
//! independent hex digest. Two files hold identical content iff their
//! digest sequences are equal element-wise, which is what the diff
//! engine's rename detection relies on.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use driftsync_core::CHUNK_SIZE;

use crate::error::FilesError;

/// Hash one chunk, returning the hex digest
#[must_use]
pub fn hash_chunk(data: &[u8]) -> String {
    hex::encode(blake3::hash(data).as_bytes())
}

/// Compute the ordered per-chunk digest list for a file.
///
/// The file is read in `CHUNK_SIZE` blocks; the final block may be
/// shorter. An empty file yields an empty list.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn chunk_hashes<P: AsRef<Path>>(path: P) -> Result<Vec<String>, FilesError> {
    let mut file = File::open(path)?;
    let mut hashes = Vec::new();
    let mut buffer = vec![0u8; CHUNK_SIZE as usize];

    loop {
        let filled = read_block(&mut file, &mut buffer)?;
        if filled == 0 {
            break;
        }
        hashes.push(hash_chunk(&buffer[..filled]));
        if filled < buffer.len() {
            break;
        }
    }

    Ok(hashes)
}

/// Fill `buffer` from `reader` as far as the stream allows
fn read_block(reader: &mut impl Read, buffer: &mut [u8]) -> Result<usize, FilesError> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = reader.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
