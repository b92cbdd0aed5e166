//! Streaming ZIP decoding.
//!
//! This module reads ZIP archives front to back from any [`std::io::Read`],
//! without seeking and without looking at the central directory first.
//!
//! ## Architecture
//!
//! - [`structures`]: record signatures, the local file header and the data descriptor
//! - [`buffer`]: the rolling lookahead buffer every other part reads through
//! - `scanner`: finds the next record signature and parses local headers
//! - `payload`: bounds an entry's compressed bytes by size or by descriptor
//! - [`decompress`]: method code to decompressor registry
//! - [`reader`]: the [`ZipStreamReader`] cursor tying it together
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers, each followed by compressed data and, for entries
//!    written without knowing their size, a data descriptor
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Only (1) is decoded. Reaching (2) ends the archive; its records are
//! skipped by length without being interpreted.
//!
//! ## Limitations
//!
//! - No ZIP64 (sizes and offsets are 32-bit)
//! - No encryption support; encrypted entries decode to garbage and fail
//!   their checksum
//! - Only STORED and DEFLATE are registered by default

pub mod buffer;
mod checksum;
pub mod decompress;
mod payload;
pub mod reader;
mod scanner;
pub mod structures;

pub use decompress::{Decompressor, DecompressorFactory, Decompressors};
pub use reader::{EntryReader, Remaining, ZipStreamReader};
pub use structures::{CompressionMethod, DataDescriptor, LocalFileHeader};
