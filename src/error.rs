//! Error type for streaming archive decoding.
//!
//! End of archive is not an error: [`ZipStreamReader::advance`] reports it
//! as `Ok(None)`. Everything else the decoder can detect is a [`ZipError`].
//!
//! [`ZipStreamReader::advance`]: crate::zip::ZipStreamReader::advance

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZipError {
    /// Input ended inside a structure that requires more bytes.
    #[error("unexpected end of input while reading {0}")]
    Truncated(&'static str),

    /// No decompressor is registered for the entry's method code.
    #[error("unsupported compression method: {0}")]
    UnsupportedMethod(u16),

    /// Decompressed data does not match the declared CRC-32.
    #[error("checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error(transparent)]
    Io(io::Error),
}

impl ZipError {
    pub fn is_truncated(&self) -> bool {
        match self {
            ZipError::Truncated(_) => true,
            ZipError::Io(err) => err.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

impl From<io::Error> for ZipError {
    /// Unwraps a `ZipError` that was carried through an `io::Error`, so errors
    /// raised inside an entry stream keep their variant.
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<ZipError>()) {
            return ZipError::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<ZipError>()) {
            Some(Ok(inner)) => *inner,
            _ => ZipError::Io(kind.into()),
        }
    }
}

impl From<ZipError> for io::Error {
    fn from(err: ZipError) -> Self {
        let kind = match err {
            ZipError::Io(inner) => return inner,
            ZipError::Truncated(_) => io::ErrorKind::UnexpectedEof,
            ZipError::UnsupportedMethod(_) => io::ErrorKind::Unsupported,
            ZipError::ChecksumMismatch { .. } => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}
