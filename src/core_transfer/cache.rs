//! Bounded write-behind cache for uploads.
//!
//! Flash-backed storage pays per write call, so incoming chunks are gathered
//! and written in as few calls as the capacity allows. The cache owns a
//! fixed allocation and tracks its fill with an explicit cursor; bytes past
//! the cursor are never read.

use log::trace;
use std::io::{self, Write};

pub struct WriteCache {
    buf: Box<[u8]>,
    fill: usize,
}

impl WriteCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            fill: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.fill
    }

    pub fn is_empty(&self) -> bool {
        self.fill == 0
    }

    /// Adds `chunk` to the cache. When the chunk would reach or exceed the
    /// capacity, the bytes cached so far go to `sink` in a single write first.
    /// A chunk that alone fills the cache is written straight through.
    pub fn push<W: Write>(&mut self, chunk: &[u8], sink: &mut W) -> io::Result<()> {
        if self.fill + chunk.len() >= self.capacity() {
            self.flush(sink)?;
        }
        if chunk.len() >= self.capacity() {
            trace!("Writing {} bytes past the cache", chunk.len());
            return sink.write_all(chunk);
        }
        self.buf[self.fill..self.fill + chunk.len()].copy_from_slice(chunk);
        self.fill += chunk.len();
        Ok(())
    }

    /// Writes out whatever is cached and resets the cursor.
    pub fn flush<W: Write>(&mut self, sink: &mut W) -> io::Result<()> {
        if self.fill == 0 {
            return Ok(());
        }
        trace!("Flushing {} cached bytes", self.fill);
        let result = sink.write_all(&self.buf[..self.fill]);
        self.fill = 0;
        result
    }

    /// Drops cached bytes without writing them.
    pub fn clear(&mut self) {
        self.fill = 0;
    }
}
