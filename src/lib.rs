//! # sunzip
//!
//! A streaming unzip: ZIP archives are decoded front to back from any
//! [`std::io::Read`], such as a pipe, a socket or an HTTP response body,
//! without seeking and without waiting for the central directory.
//!
//! Each entry's data is available as a readable stream as soon as its local
//! header has arrived. Entries written with a data descriptor (sizes unknown
//! when the header was written) are bounded by scanning ahead for the
//! descriptor while the data streams through.
//!
//! ## Features
//!
//! - Single pass, bounded memory: a lookahead buffer of about 4 KiB
//! - STORED and DEFLATE entries, with a registry for other methods
//! - CRC-32 verification of every entry read to the end
//! - Concatenated archives, and recovery of bytes following an archive
//!
//! ## Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::Read;
//! use sunzip::ZipStreamReader;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut archive = ZipStreamReader::new(File::open("archive.zip")?);
//!
//!     while let Some(header) = archive.advance()? {
//!         let mut contents = Vec::new();
//!         if let Some(mut entry) = archive.entry() {
//!             entry.read_to_end(&mut contents)?;
//!         }
//!         println!("{} ({} bytes)", header.file_name(), contents.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::ZipError;
pub use zip::{EntryReader, LocalFileHeader, ZipStreamReader};
