//! Signature scanning and record parsing on the rolling buffer.
//!
//! The scanner never looks further ahead than [`MAX_READ`] bytes. When no
//! signature is found it slides forward but keeps the last
//! `SIGNATURE_PREFIX.len() - 1` bytes, so a signature split across two
//! refills is still found on the next pass.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use memchr::memmem;
use std::io::{self, BufRead, Read};

use super::buffer::{MAX_READ, PeekReader};
use super::structures::*;
use crate::error::ZipError;

/// Outcome of looking for the next record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// Positioned at a local file header signature
    LocalFile,
    /// Positioned at the start of the central directory region
    Directory,
    /// Input ended with too little left to hold any further structure
    Exhausted,
}

/// Advance `source` to the next local header or directory signature.
pub(crate) fn find_next_record<R: Read>(source: &mut PeekReader<R>) -> io::Result<Scan> {
    loop {
        let window = source.peek(MAX_READ)?;

        match Record::at(window) {
            Some(Record::LocalFile) => return Ok(Scan::LocalFile),
            Some(Record::Directory) => return Ok(Scan::Directory),
            None => {}
        }

        // A short window only happens at end of input.
        if window.len() < MIN_TRAILER_LEN {
            return Ok(Scan::Exhausted);
        }

        let skip = match memmem::find(&window[1..], SIGNATURE_PREFIX) {
            Some(index) => index + 1,
            None => window.len() - (SIGNATURE_PREFIX.len() - 1),
        };
        debug!("skipping {} bytes of unrecognised data", skip);
        source.consume(skip);
    }
}

/// Read a local file header, including its name and extra field.
///
/// `source` must be positioned at the header signature.
pub(crate) fn read_local_header<R: Read>(
    source: &mut PeekReader<R>,
) -> Result<LocalFileHeader, ZipError> {
    let mut fixed = [0u8; LFH_SIZE];
    read_exact_or(source, &mut fixed, "local file header")?;
    let (mut header, name_len, extra_len) = LocalFileHeader::from_bytes(&fixed)?;

    let name_len = usize::from(name_len);
    let mut variable = vec![0u8; name_len + usize::from(extra_len)];
    read_exact_or(source, &mut variable, "local file name and extra field")?;
    header.extra = variable.split_off(name_len);
    header.name = variable;

    Ok(header)
}

/// Consume the central directory region up to and including the end record.
///
/// Records are walked using only their length fields. Anything that is not a
/// directory record ends the walk without consuming it.
pub(crate) fn skip_directory<R: Read>(source: &mut PeekReader<R>) -> Result<(), ZipError> {
    let mut records = 0usize;
    loop {
        let window = source.peek(EOCD_MIN_SIZE.max(CDFH_MIN_SIZE))?;
        let Some(sig) = window.get(..SIGNATURE_LEN) else {
            debug!("input ended inside the central directory after {} records", records);
            return Ok(());
        };

        if sig == CDFH_SIGNATURE {
            let fixed = require(window, CDFH_MIN_SIZE, "central directory header")?;
            let variable = u64::from(LittleEndian::read_u16(&fixed[28..]))
                + u64::from(LittleEndian::read_u16(&fixed[30..]))
                + u64::from(LittleEndian::read_u16(&fixed[32..]));
            skip_or(source, CDFH_MIN_SIZE as u64 + variable, "central directory header")?;
            records += 1;
        } else if sig == DIGITAL_SIGNATURE {
            let fixed = require(window, DIGITAL_SIGNATURE_MIN_SIZE, "digital signature")?;
            let len = u64::from(LittleEndian::read_u16(&fixed[4..]));
            skip_or(source, DIGITAL_SIGNATURE_MIN_SIZE as u64 + len, "digital signature")?;
        } else if sig == EOCD_SIGNATURE {
            let fixed = require(window, EOCD_MIN_SIZE, "end of central directory")?;
            let comment = u64::from(LittleEndian::read_u16(&fixed[20..]));
            skip_or(source, EOCD_MIN_SIZE as u64 + comment, "end of central directory")?;
            debug!("skipped central directory with {} records", records);
            return Ok(());
        } else {
            debug!("central directory ended without an end record after {} records", records);
            return Ok(());
        }
    }
}

fn require<'a>(window: &'a [u8], len: usize, what: &'static str) -> Result<&'a [u8], ZipError> {
    window.get(..len).ok_or(ZipError::Truncated(what))
}

fn skip_or<R: Read>(source: &mut PeekReader<R>, n: u64, what: &'static str) -> Result<(), ZipError> {
    source.skip(n).map_err(|err| truncated_or(err, what))
}

fn read_exact_or<R: Read>(
    source: &mut PeekReader<R>,
    buf: &mut [u8],
    what: &'static str,
) -> Result<(), ZipError> {
    source.read_exact(buf).map_err(|err| truncated_or(err, what))
}

/// Map a short read to `Truncated(what)`; any other error stays an I/O error.
pub(crate) fn truncated_or(err: io::Error, what: &'static str) -> ZipError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ZipError::Truncated(what)
    } else {
        ZipError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::buffer::tests::Trickle;

    fn local_header(name: &[u8], extra: &[u8]) -> Vec<u8> {
        let mut buf = Vec::from(LFH_SIGNATURE);
        buf.extend_from_slice(&[20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        buf.extend_from_slice(&[0; 12]);
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&(extra.len() as u16).to_le_bytes());
        buf.extend_from_slice(name);
        buf.extend_from_slice(extra);
        buf
    }

    fn end_record(comment: &[u8]) -> Vec<u8> {
        let mut buf = Vec::from(EOCD_SIGNATURE);
        buf.extend_from_slice(&[0; 16]);
        buf.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        buf.extend_from_slice(comment);
        buf
    }

    #[test]
    fn finds_header_at_current_position() {
        let data = local_header(b"a.txt", b"");
        let mut source = PeekReader::new(&data[..]);
        assert_eq!(find_next_record(&mut source).unwrap(), Scan::LocalFile);
        assert_eq!(source.buffer().len(), data.len());
    }

    #[test]
    fn slides_over_leading_garbage() {
        let mut data = vec![b'P'; 100];
        data.extend(local_header(b"a.txt", b""));
        let mut source = PeekReader::new(&data[..]);

        assert_eq!(find_next_record(&mut source).unwrap(), Scan::LocalFile);
        assert!(source.buffer().starts_with(LFH_SIGNATURE));
    }

    #[test]
    fn finds_signature_split_across_refills() {
        // Garbage sized so the signature straddles the first scan window.
        let mut data = vec![0u8; MAX_READ - 1];
        data.extend(local_header(b"split", &[0; 80]));
        let mut source = PeekReader::new(Trickle(&data));

        assert_eq!(find_next_record(&mut source).unwrap(), Scan::LocalFile);
        let header = read_local_header(&mut source).unwrap();
        assert_eq!(header.name, b"split");
    }

    #[test]
    fn short_tail_without_signature_is_exhausted() {
        let data = [0x55u8; MIN_TRAILER_LEN - 1];
        let mut source = PeekReader::new(&data[..]);
        assert_eq!(find_next_record(&mut source).unwrap(), Scan::Exhausted);
    }

    #[test]
    fn long_garbage_is_exhausted_once_the_tail_is_short() {
        let data = vec![0x11u8; 3 * MAX_READ];
        let mut source = PeekReader::new(&data[..]);
        assert_eq!(find_next_record(&mut source).unwrap(), Scan::Exhausted);
    }

    #[test]
    fn reports_directory_start() {
        let mut data = vec![0u8; 200];
        data.extend(end_record(b""));
        let mut source = PeekReader::new(&data[..]);
        assert_eq!(find_next_record(&mut source).unwrap(), Scan::Directory);
    }

    #[test]
    fn header_splits_name_and_extra() {
        let data = local_header(b"dir/file.bin", b"\x55\x54\x01\x00\x07");
        let mut source = PeekReader::new(&data[..]);
        let header = read_local_header(&mut source).unwrap();

        assert_eq!(header.file_name(), "dir/file.bin");
        assert_eq!(header.extra, b"\x55\x54\x01\x00\x07");
        assert!(source.buffer().is_empty());
    }

    #[test]
    fn header_truncated_in_fixed_part() {
        let data = local_header(b"name", b"");
        let mut source = PeekReader::new(&data[..20]);
        let err = read_local_header(&mut source).unwrap_err();
        assert!(matches!(err, ZipError::Truncated("local file header")));
    }

    #[test]
    fn header_truncated_in_name() {
        let data = local_header(b"a-long-name", b"");
        let mut source = PeekReader::new(&data[..LFH_SIZE + 3]);
        let err = read_local_header(&mut source).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn skips_directory_and_stops_after_end_record() {
        let mut central = Vec::from(CDFH_SIGNATURE);
        central.extend_from_slice(&[0; 24]);
        central.extend_from_slice(&3u16.to_le_bytes());
        central.extend_from_slice(&2u16.to_le_bytes());
        central.extend_from_slice(&1u16.to_le_bytes());
        central.extend_from_slice(&[0; 12]);
        central.extend_from_slice(b"abcXYc");

        let mut data = central;
        data.extend(end_record(b"hi"));
        data.extend_from_slice(b"next");

        let mut source = PeekReader::new(&data[..]);
        skip_directory(&mut source).unwrap();
        assert_eq!(source.peek(16).unwrap(), b"next");
    }

    #[test]
    fn only_short_reads_become_truncation() {
        let short = truncated_or(io::ErrorKind::UnexpectedEof.into(), "data descriptor");
        assert!(matches!(short, ZipError::Truncated("data descriptor")));

        let reset = truncated_or(io::ErrorKind::ConnectionReset.into(), "data descriptor");
        assert!(matches!(reset, ZipError::Io(ref e) if e.kind() == io::ErrorKind::ConnectionReset));
    }

    #[test]
    fn truncated_end_record_is_an_error() {
        let data = end_record(b"a comment");
        let mut source = PeekReader::new(&data[..EOCD_MIN_SIZE + 2]);
        assert!(skip_directory(&mut source).unwrap_err().is_truncated());
    }
}
