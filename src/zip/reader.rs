//! Forward-only archive cursor.
//!
//! ## Usage
//!
//! ```no_run
//! use std::io::Read;
//! use sunzip::zip::ZipStreamReader;
//!
//! # fn main() -> Result<(), sunzip::ZipError> {
//! let mut archive = ZipStreamReader::new(std::io::stdin().lock());
//! while let Some(header) = archive.advance()? {
//!     let mut data = Vec::new();
//!     if let Some(mut entry) = archive.entry() {
//!         entry.read_to_end(&mut data)?;
//!     }
//!     println!("{}: {} bytes", header.file_name(), data.len());
//! }
//! # Ok(())
//! # }
//! ```

use log::debug;
use std::io::{self, Cursor, Read};

use super::buffer::PeekReader;
use super::checksum::Crc32Check;
use super::decompress::{Decompressor, DecompressorFactory, Decompressors};
use super::payload::{Bound, Payload};
use super::scanner::{Scan, find_next_record, read_local_header, skip_directory};
use super::structures::LocalFileHeader;
use crate::error::ZipError;

/// Unconsumed bytes followed by the rest of the source.
pub type Remaining<R> = io::Chain<Cursor<Vec<u8>>, R>;

enum State {
    BeforeFirst,
    AtEntry(Entry),
    Done,
}

/// The entry currently being decoded.
struct Entry {
    header: LocalFileHeader,
    bound: Bound,
    decompressor: Box<dyn Decompressor>,
    crc: Crc32Check,
    finished: bool,
}

impl Entry {
    fn new(header: LocalFileHeader, decompressors: &Decompressors) -> Result<Self, ZipError> {
        let decompressor = decompressors.get(header.compression_method)?;
        Ok(Self {
            bound: Bound::for_header(&header),
            header,
            decompressor,
            crc: Crc32Check::default(),
            finished: false,
        })
    }

    fn read<R: Read>(&mut self, source: &mut PeekReader<R>, out: &mut [u8]) -> io::Result<usize> {
        if self.finished {
            return Ok(0);
        }

        let mut payload = Payload {
            source,
            bound: &mut self.bound,
            header: &mut self.header,
        };
        let n = self.decompressor.decompress(&mut payload, out)?;
        if n > 0 || out.is_empty() {
            self.crc.update(&out[..n]);
            return Ok(n);
        }

        // Decompressed data is complete. Step over whatever compressed bytes
        // remain so the descriptor, if any, has been read.
        let unused = io::copy(&mut payload, &mut io::sink())?;
        if unused > 0 {
            debug!("{}: skipped {} bytes after compressed data", self.header.file_name(), unused);
        }
        self.finished = true;
        self.crc.verify(self.header.crc32)?;
        Ok(0)
    }

    fn drain<R: Read>(&mut self, source: &mut PeekReader<R>) -> io::Result<()> {
        let mut scratch = [0u8; 8192];
        while self.read(source, &mut scratch)? > 0 {}
        Ok(())
    }
}

/// Readable view of the current entry's decompressed data.
///
/// Reaching the end of the data verifies the entry's CRC-32; a mismatch is
/// returned as an [`io::ErrorKind::InvalidData`] error wrapping
/// [`ZipError::ChecksumMismatch`] instead of a clean end of stream.
pub struct EntryReader<'a, R> {
    entry: &'a mut Entry,
    source: &'a mut PeekReader<R>,
}

impl<R: Read> EntryReader<'_, R> {
    /// Header of the entry; crc and sizes from a data descriptor appear here
    /// once the entry has been read to the end.
    pub fn header(&self) -> &LocalFileHeader {
        &self.entry.header
    }
}

impl<R: Read> Read for EntryReader<'_, R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        self.entry.read(self.source, out)
    }
}

/// Sequential reader over a ZIP archive arriving as a byte stream.
///
/// [`advance`](Self::advance) moves to the next entry (including the first)
/// and [`entry`](Self::entry) reads its data. Any part of an entry left
/// unread is decompressed, checked and discarded by the next `advance`.
///
/// When the central directory is reached, `advance` returns `Ok(None)`.
/// Calling it again treats whatever follows as another archive. The bytes
/// buffered past the end of an archive are available through
/// [`buffered`](Self::buffered) and [`into_remaining`](Self::into_remaining).
pub struct ZipStreamReader<R> {
    source: PeekReader<R>,
    state: State,
    decompressors: Decompressors,
}

impl<R: Read> ZipStreamReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_decompressors(source, Decompressors::default())
    }

    pub fn with_decompressors(source: R, decompressors: Decompressors) -> Self {
        Self {
            source: PeekReader::new(source),
            state: State::BeforeFirst,
            decompressors,
        }
    }

    /// Add or replace the decompressor used for `method`.
    pub fn register_decompressor(&mut self, method: u16, factory: DecompressorFactory) {
        self.decompressors.register(method, factory);
    }

    /// Move to the next entry and return its local header.
    ///
    /// Returns `Ok(None)` at the end of the archive, either at the central
    /// directory (which is consumed) or when the input ends with too little
    /// left to hold one. An entry with an unregistered compression method
    /// fails with [`ZipError::UnsupportedMethod`] before any of its data is
    /// read.
    pub fn advance(&mut self) -> Result<Option<LocalFileHeader>, ZipError> {
        if let State::AtEntry(entry) = &mut self.state {
            entry.drain(&mut self.source)?;
        }

        match find_next_record(&mut self.source)? {
            Scan::LocalFile => {
                let header = read_local_header(&mut self.source)?;
                // The previous entry is gone either way.
                self.state = State::BeforeFirst;
                let entry = Entry::new(header.clone(), &self.decompressors)?;
                debug!(
                    "entry {}: method {}, flags {:#06x}",
                    header.file_name(),
                    header.compression_method.as_u16(),
                    header.flags
                );
                self.state = State::AtEntry(entry);
                Ok(Some(header))
            }
            Scan::Directory => {
                skip_directory(&mut self.source)?;
                self.state = State::Done;
                Ok(None)
            }
            Scan::Exhausted => {
                debug!("input exhausted");
                self.state = State::Done;
                Ok(None)
            }
        }
    }

    /// Reader for the current entry, or `None` before the first entry and
    /// after the end of the archive.
    pub fn entry(&mut self) -> Option<EntryReader<'_, R>> {
        match &mut self.state {
            State::AtEntry(entry) => Some(EntryReader {
                entry,
                source: &mut self.source,
            }),
            State::BeforeFirst | State::Done => None,
        }
    }

    /// Header of the current entry, updated from its data descriptor once
    /// the entry has been read to the end.
    pub fn header(&self) -> Option<&LocalFileHeader> {
        match &self.state {
            State::AtEntry(entry) => Some(&entry.header),
            State::BeforeFirst | State::Done => None,
        }
    }

    /// True once `advance` has reported the end of an archive.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Bytes read from the source but not consumed yet.
    pub fn buffered(&self) -> &[u8] {
        self.source.buffer()
    }

    /// Give back everything not consumed: buffered bytes, then the source.
    ///
    /// Useful to hand data following the archive to something else, or to a
    /// fresh `ZipStreamReader`.
    pub fn into_remaining(self) -> Remaining<R> {
        let (buffered, source) = self.source.into_parts();
        Cursor::new(buffered).chain(source)
    }
}
