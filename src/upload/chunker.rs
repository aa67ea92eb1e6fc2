//! Lazy fixed-size chunking of a local file
//!
//! The reader holds one open file handle for the duration of iteration and
//! releases it when the iterator is dropped. Chunks come out in file order
//! with 1-based sequential part numbers; only the last chunk may be short.

use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;

use bytes::Bytes;

/// One part payload read from the file
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 1-based, sequential, no gaps
    pub part_number: u64,
    pub payload: Bytes,
}

/// Number of parts a file of `total_size` splits into
pub fn part_count(total_size: u64, chunk_size: usize) -> u64 {
    total_size.div_ceil(chunk_size as u64)
}

/// Iterator of [`Chunk`]s over a file
///
/// Finite and non-restartable: an empty read ends the sequence, and a read
/// error ends it after yielding the error once.
pub struct ChunkReader {
    file: File,
    chunk_size: usize,
    next_part: u64,
    done: bool,
}

impl ChunkReader {
    pub fn open(path: &Path, chunk_size: usize) -> io::Result<Self> {
        debug_assert!(chunk_size > 0);
        let file = File::open(path)?;
        Ok(Self {
            file,
            chunk_size,
            next_part: 0,
            done: false,
        })
    }
}

impl Iterator for ChunkReader {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        if filled == 0 {
            self.done = true;
            return None;
        }

        buf.truncate(filled);
        self.next_part += 1;
        Some(Ok(Chunk {
            part_number: self.next_part,
            payload: Bytes::from(buf),
        }))
    }
}
