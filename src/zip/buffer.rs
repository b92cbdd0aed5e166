//! Rolling lookahead buffer over a forward-only source.

use std::io::{self, BufRead, Read};

/// Largest step a scanner takes through the buffer in one pass.
pub const MAX_READ: usize = 4096;

/// Bytes kept beyond a scan step so a record straddling the step is still
/// visible: a 16 byte descriptor, a 4 byte signature and some slack.
pub const READ_AHEAD: usize = 28;

pub const BUFFER_SIZE: usize = MAX_READ + READ_AHEAD;

/// Buffered reader that can peek up to [`BUFFER_SIZE`] bytes ahead.
///
/// Unlike [`std::io::BufReader`], [`peek`](Self::peek) keeps reading until
/// the requested amount is buffered, compacting unread bytes to the front
/// first, so callers see a stable window regardless of how the source
/// chunks its reads.
pub struct PeekReader<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
}

impl<R: Read> PeekReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(BUFFER_SIZE, inner)
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner,
            buf: vec![0u8; capacity].into_boxed_slice(),
            pos: 0,
            filled: 0,
        }
    }

    /// Return at least `n` buffered bytes, or fewer only at end of input.
    ///
    /// `n` is clamped to the buffer capacity.
    pub fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        let n = n.min(self.buf.len());
        if self.filled - self.pos < n {
            self.buf.copy_within(self.pos..self.filled, 0);
            self.filled -= self.pos;
            self.pos = 0;

            while self.filled < n {
                match self.inner.read(&mut self.buf[self.filled..]) {
                    Ok(0) => break,
                    Ok(read) => self.filled += read,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(self.buffer())
    }

    /// Bytes currently buffered and not yet consumed
    pub fn buffer(&self) -> &[u8] {
        &self.buf[self.pos..self.filled]
    }

    /// Read and throw away exactly `n` bytes.
    pub fn skip(&mut self, n: u64) -> io::Result<()> {
        let skipped = io::copy(&mut self.by_ref().take(n), &mut io::sink())?;
        if skipped < n {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(())
    }

    /// Unconsumed buffered bytes and the source they were read from
    pub fn into_parts(self) -> (Vec<u8>, R) {
        let rest = self.buf[self.pos..self.filled].to_vec();
        (rest, self.inner)
    }
}

impl<R: Read> Read for PeekReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        // Large reads on an empty buffer go straight to the source.
        if self.pos == self.filled && out.len() >= self.buf.len() {
            return self.inner.read(out);
        }
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: Read> BufRead for PeekReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos == self.filled {
            self.pos = 0;
            self.filled = 0;
            loop {
                match self.inner.read(&mut self.buf) {
                    Ok(read) => {
                        self.filled = read;
                        break;
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(self.buffer())
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.filled);
    }
}
