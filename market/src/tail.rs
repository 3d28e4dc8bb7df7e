//! Tail Reader
//!
//! Recovers the last `K` lines of an append-only log without reading the
//! whole file.
//!
//! ## Algorithm
//!
//! A [`ReverseCursor`] walks the file backwards one block at a time, starting
//! at the size observed when the read began. Bytes of each block are scanned
//! from last to first; every newline crossed closes the line that starts right
//! after it, which is pushed to the front of a bounded [`LineRing`]. The scan
//! stops as soon as the ring holds `K` lines or the start of the file is
//! reached (the start of the file closes the first line).
//!
//! ```text
//!   file:  a\n b\n c\n d      (d is still being appended)
//!                       ^ scan starts here, moving left
//!   d    → dropped, no newline after it
//!   c, b → captured on the newline before each of them
//!   a    → captured at start of file
//! ```
//!
//! ## Trailing fragment
//! Bytes after the last newline are never returned. A writer appending to the
//! log may be in the middle of a record; only newline-terminated lines count.
//!
//! ## Consistency
//! The file may grow while it is being read. Anything appended after the size
//! probe is ignored until the next read.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::TailError;

/// Number of lines read per cycle unless configured otherwise.
pub const DEFAULT_TAIL_LINES: usize = 80;

const DEFAULT_BLOCK_SIZE: usize = 4096;

#[derive(Clone, Copy, Debug)]
pub struct TailReader {
    max_lines: usize,
    block_size: usize,
}

impl Default for TailReader {
    fn default() -> Self {
        Self::new(DEFAULT_TAIL_LINES)
    }
}

impl TailReader {
    pub fn new(max_lines: usize) -> Self {
        Self {
            max_lines,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Overrides the number of bytes fetched per backward seek.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Reads the last lines of the file at `path`, oldest first.
    pub fn read_path(&self, path: &Path) -> Result<Vec<String>, TailError> {
        let file = File::open(path).map_err(|source| TailError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        self.read_from(file).map_err(|source| TailError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the last lines of any seekable source, oldest first.
    ///
    /// Lines are trimmed of surrounding whitespace (including `\r`). Invalid
    /// UTF-8 is replaced rather than rejected; such lines fail to parse later.
    pub fn read_from<R: Read + Seek>(&self, src: R) -> io::Result<Vec<String>> {
        let mut ring = LineRing::new(self.max_lines);
        if ring.is_full() {
            return Ok(ring.into_lines());
        }

        let mut cursor = ReverseCursor::new(src, self.block_size)?;

        // Bytes of the line currently being assembled, in reverse order.
        let mut pending: Vec<u8> = Vec::new();
        // Set once the newline closing the last complete line has been seen.
        let mut terminated = false;

        while let Some(block) = cursor.next_block()? {
            for &byte in block.iter().rev() {
                if byte != b'\n' {
                    pending.push(byte);
                    continue;
                }

                if terminated {
                    ring.push_front(take_line(&mut pending));
                    if ring.is_full() {
                        return Ok(ring.into_lines());
                    }
                } else {
                    terminated = true;
                    pending.clear();
                }
            }
        }

        if terminated {
            ring.push_front(take_line(&mut pending));
        }

        Ok(ring.into_lines())
    }
}

/// Turns the reversed bytes of a line into a trimmed string and resets the
/// buffer for the next line.
fn take_line(pending: &mut Vec<u8>) -> String {
    pending.reverse();
    let line = String::from_utf8_lossy(pending).trim().to_string();
    pending.clear();
    line
}

/// Fixed-capacity buffer of captured lines. Lines arrive newest first and are
/// stored oldest first.
struct LineRing {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LineRing {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    fn push_front(&mut self, line: String) {
        if !self.is_full() {
            self.lines.push_front(line);
        }
    }

    fn is_full(&self) -> bool {
        self.lines.len() >= self.capacity
    }

    fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}

/// Backward-seek cursor state: `pos` is the offset of the first byte that has
/// already been handed out. Blocks are produced right to left until `pos`
/// reaches zero.
struct ReverseCursor<R> {
    inner: R,
    pos: u64,
    buf: Vec<u8>,
}

impl<R: Read + Seek> ReverseCursor<R> {
    fn new(mut inner: R, block_size: usize) -> io::Result<Self> {
        let pos = inner.seek(SeekFrom::End(0))?;

        Ok(Self {
            inner,
            pos,
            buf: vec![0; block_size],
        })
    }

    fn next_block(&mut self) -> io::Result<Option<&[u8]>> {
        if self.pos == 0 {
            return Ok(None);
        }

        let len = self.pos.min(self.buf.len() as u64) as usize;
        self.pos -= len as u64;

        self.inner.seek(SeekFrom::Start(self.pos))?;
        self.inner.read_exact(&mut self.buf[..len])?;

        Ok(Some(&self.buf[..len]))
    }
}
