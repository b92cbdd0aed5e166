//! Bounding an entry's compressed bytes inside the shared source.
//!
//! An entry either declares its compressed size up front, or sets the data
//! descriptor flag and leaves sizes and crc for a descriptor written after the
//! data. In the second case the end of the data is only found by watching the
//! bytes as they stream past for a descriptor followed by the next record's
//! signature.

use byteorder::{ByteOrder, LittleEndian};
use log::trace;
use memchr::memmem;
use std::io::{self, BufRead, Read};

use super::buffer::{MAX_READ, PeekReader, READ_AHEAD};
use super::scanner::truncated_or;
use super::structures::*;
use crate::error::ZipError;

/// Bytes that must follow a candidate end of data before it can be checked:
/// the largest descriptor plus the signature after it.
const BOUNDARY_LOOKAHEAD: usize = DataDescriptor::SIZE_WITH_SIGNATURE + SIGNATURE_LEN;

#[derive(Debug)]
pub(crate) enum Bound {
    /// Compressed size known from the local header; counts down to zero.
    Known { remaining: u64 },
    /// Compressed size unknown until a descriptor is found.
    Descriptor(DescriptorScan),
}

impl Bound {
    pub(crate) fn for_header(header: &LocalFileHeader) -> Self {
        if header.has_data_descriptor() {
            Bound::Descriptor(DescriptorScan::default())
        } else {
            Bound::Known {
                remaining: u64::from(header.compressed_size),
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct DescriptorScan {
    /// Payload bytes handed out so far
    streamed: u64,
    /// Bytes at the front of the buffer known to belong to the payload
    ready: usize,
    /// Length of the descriptor that starts once `ready` reaches zero
    boundary: Option<usize>,
    done: bool,
}

impl DescriptorScan {
    /// Refill `ready`, or consume the descriptor once the payload is used up.
    fn advance<R: Read>(
        &mut self,
        source: &mut PeekReader<R>,
        header: &mut LocalFileHeader,
    ) -> io::Result<()> {
        while self.ready == 0 && !self.done {
            if let Some(len) = self.boundary {
                let mut block = [0u8; DataDescriptor::SIZE_WITH_SIGNATURE];
                source
                    .read_exact(&mut block[..len])
                    .map_err(|err| truncated_or(err, "data descriptor"))?;
                let descriptor = DataDescriptor::from_bytes(&block[..len])
                    .ok_or(ZipError::Truncated("data descriptor"))?;
                trace!(
                    "data descriptor after {} bytes: crc {:#010x}, size {}",
                    self.streamed, descriptor.crc32, descriptor.uncompressed_size
                );
                header.apply_descriptor(&descriptor);
                self.done = true;
                break;
            }

            let window = source.peek(MAX_READ + READ_AHEAD)?;
            let at_eof = window.len() < MAX_READ + READ_AHEAD;
            match find_boundary(window, self.streamed) {
                Some((end, len)) => {
                    self.ready = end;
                    self.boundary = Some(len);
                }
                None if at_eof => return Err(ZipError::Truncated("data descriptor").into()),
                None => self.ready = window.len() - BOUNDARY_LOOKAHEAD,
            }
        }
        Ok(())
    }
}

/// Find the first offset in `window` where a descriptor describing exactly
/// `streamed + offset` compressed bytes is followed by a record signature.
///
/// Returns the offset and the descriptor's length (with or without marker).
fn find_boundary(window: &[u8], streamed: u64) -> Option<(usize, usize)> {
    let size_matches = |fields: &[u8], end: usize| {
        u64::from(LittleEndian::read_u32(&fields[4..8])) == streamed + end as u64
    };

    for sig in memmem::find_iter(window, SIGNATURE_PREFIX) {
        if Record::at(&window[sig..]).is_none() {
            continue;
        }
        if let Some(end) = sig.checked_sub(DataDescriptor::SIZE_WITH_SIGNATURE) {
            if window[end..].starts_with(DATA_DESCRIPTOR_SIGNATURE)
                && size_matches(&window[end + SIGNATURE_LEN..sig], end)
            {
                return Some((end, DataDescriptor::SIZE_WITH_SIGNATURE));
            }
        }
        if let Some(end) = sig.checked_sub(DataDescriptor::SIZE) {
            if size_matches(&window[end..sig], end) {
                return Some((end, DataDescriptor::SIZE));
            }
        }
    }
    None
}

/// Compressed bytes of the current entry, read through the shared source.
pub(crate) struct Payload<'a, R> {
    pub(crate) source: &'a mut PeekReader<R>,
    pub(crate) bound: &'a mut Bound,
    pub(crate) header: &'a mut LocalFileHeader,
}

impl<R: Read> BufRead for Payload<'_, R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match &mut *self.bound {
            Bound::Known { remaining } => {
                if *remaining == 0 {
                    return Ok(&[]);
                }
                let data = self.source.fill_buf()?;
                if data.is_empty() {
                    return Err(ZipError::Truncated("entry data").into());
                }
                let n = usize::try_from(*remaining).map_or(data.len(), |r| r.min(data.len()));
                Ok(&data[..n])
            }
            Bound::Descriptor(scan) => {
                scan.advance(self.source, self.header)?;
                Ok(&self.source.buffer()[..scan.ready])
            }
        }
    }

    fn consume(&mut self, amt: usize) {
        match &mut *self.bound {
            Bound::Known { remaining } => *remaining -= amt as u64,
            Bound::Descriptor(scan) => {
                scan.ready -= amt;
                scan.streamed += amt as u64;
            }
        }
        self.source.consume(amt);
    }
}

impl<R: Read> Read for Payload<'_, R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let data = self.fill_buf()?;
        let n = data.len().min(out.len());
        out[..n].copy_from_slice(&data[..n]);
        self.consume(n);
        Ok(n)
    }
}
