//! Decompression transforms keyed by compression method code.

use flate2::{Decompress, FlushDecompress, Status};
use std::collections::HashMap;
use std::io::{self, BufRead};

use super::structures::CompressionMethod;
use crate::error::ZipError;

/// Streaming decompressor for one entry.
///
/// `input` yields the entry's compressed bytes and reports end of data with
/// an empty `fill_buf`. Returning `Ok(0)` for a non-empty `out` means the
/// decompressed stream is complete.
pub trait Decompressor {
    fn decompress(&mut self, input: &mut dyn BufRead, out: &mut [u8]) -> io::Result<usize>;
}

/// Builds a fresh decompressor for each entry.
pub type DecompressorFactory = fn() -> Box<dyn Decompressor>;

/// Method 0: data is copied through unchanged.
#[derive(Debug, Default)]
pub struct Stored;

impl Decompressor for Stored {
    fn decompress(&mut self, input: &mut dyn BufRead, out: &mut [u8]) -> io::Result<usize> {
        let data = input.fill_buf()?;
        let n = data.len().min(out.len());
        out[..n].copy_from_slice(&data[..n]);
        input.consume(n);
        Ok(n)
    }
}

/// Method 8: raw DEFLATE.
pub struct Inflate {
    state: Decompress,
    done: bool,
}

impl Default for Inflate {
    fn default() -> Self {
        Self {
            state: Decompress::new(false),
            done: false,
        }
    }
}

impl Decompressor for Inflate {
    fn decompress(&mut self, input: &mut dyn BufRead, out: &mut [u8]) -> io::Result<usize> {
        if self.done || out.is_empty() {
            return Ok(0);
        }

        loop {
            let data = input.fill_buf()?;
            let eof = data.is_empty();
            let before_in = self.state.total_in();
            let before_out = self.state.total_out();
            let flush = if eof {
                FlushDecompress::Finish
            } else {
                FlushDecompress::None
            };

            let status = self
                .state
                .decompress(data, out, flush)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

            let consumed = (self.state.total_in() - before_in) as usize;
            let produced = (self.state.total_out() - before_out) as usize;
            input.consume(consumed);

            if status == Status::StreamEnd {
                self.done = true;
                return Ok(produced);
            }
            if produced > 0 {
                return Ok(produced);
            }
            if eof && consumed == 0 {
                return Err(ZipError::Truncated("deflate stream").into());
            }
        }
    }
}

fn new_stored() -> Box<dyn Decompressor> {
    Box::new(Stored)
}

fn new_inflate() -> Box<dyn Decompressor> {
    Box::new(Inflate::default())
}

/// Registry mapping method codes to decompressor factories.
#[derive(Clone)]
pub struct Decompressors {
    factories: HashMap<u16, DecompressorFactory>,
}

impl Default for Decompressors {
    /// Stored and deflate are registered.
    fn default() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(CompressionMethod::Stored.as_u16(), new_stored);
        registry.register(CompressionMethod::Deflate.as_u16(), new_inflate);
        registry
    }
}

impl Decompressors {
    /// Register or replace the factory for `method`.
    pub fn register(&mut self, method: u16, factory: DecompressorFactory) {
        self.factories.insert(method, factory);
    }

    pub fn supports(&self, method: CompressionMethod) -> bool {
        self.factories.contains_key(&method.as_u16())
    }

    /// Create a decompressor for `method`, or fail without touching any input.
    pub fn get(&self, method: CompressionMethod) -> Result<Box<dyn Decompressor>, ZipError> {
        self.factories
            .get(&method.as_u16())
            .map(|factory| factory())
            .ok_or(ZipError::UnsupportedMethod(method.as_u16()))
    }
}
