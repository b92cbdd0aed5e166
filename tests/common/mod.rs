//! Archive builder shared by the integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::{self, Read, Write};

pub const STORED: u16 = 0;
pub const DEFLATE: u16 = 8;

/// How an entry's crc and sizes are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizes {
    /// In the local header
    Header,
    /// In a data descriptor with the `PK\x07\x08` marker
    Descriptor,
    /// In a data descriptor without the marker
    BareDescriptor,
}

/// Writes ZIP archives: local headers and data, then a central directory
/// and end record.
pub struct ArchiveBuilder {
    out: Vec<u8>,
    central: Vec<u8>,
    count: u16,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            central: Vec::new(),
            count: 0,
        }
    }

    /// Start the archive after some unrelated bytes, like a self-extractor stub.
    pub fn with_prefix(prefix: &[u8]) -> Self {
        let mut builder = Self::new();
        builder.out.extend_from_slice(prefix);
        builder
    }

    pub fn add(self, name: &str, data: &[u8], method: u16, sizes: Sizes) -> Self {
        let payload = match method {
            DEFLATE => deflate(data),
            _ => data.to_vec(),
        };
        self.add_raw(name, &payload, data, method, sizes)
    }

    /// Add an entry whose compressed bytes are given verbatim.
    pub fn add_raw(
        mut self,
        name: &str,
        payload: &[u8],
        data: &[u8],
        method: u16,
        sizes: Sizes,
    ) -> Self {
        let crc = crc32fast::hash(data);
        let flags: u16 = if sizes == Sizes::Header { 0 } else { 0x0008 };
        let offset = self.out.len() as u32;
        let (csize, usize_) = (payload.len() as u32, data.len() as u32);
        let (time, date) = ((12 << 11) | (30 << 5), (45 << 9) | (1 << 5) | 15);

        let out = &mut self.out;
        out.extend_from_slice(b"PK\x03\x04");
        put16(out, 20);
        put16(out, flags);
        put16(out, method);
        put16(out, time);
        put16(out, date);
        if sizes == Sizes::Header {
            put32(out, crc);
            put32(out, csize);
            put32(out, usize_);
        } else {
            put32(out, 0);
            put32(out, 0);
            put32(out, 0);
        }
        put16(out, name.len() as u16);
        put16(out, 0);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(payload);

        if sizes != Sizes::Header {
            if sizes == Sizes::Descriptor {
                out.extend_from_slice(b"PK\x07\x08");
            }
            put32(out, crc);
            put32(out, csize);
            put32(out, usize_);
        }

        let cd = &mut self.central;
        cd.extend_from_slice(b"PK\x01\x02");
        put16(cd, 20);
        put16(cd, 20);
        put16(cd, flags);
        put16(cd, method);
        put16(cd, time);
        put16(cd, date);
        put32(cd, crc);
        put32(cd, csize);
        put32(cd, usize_);
        put16(cd, name.len() as u16);
        put16(cd, 0);
        put16(cd, 0);
        put16(cd, 0);
        put16(cd, 0);
        put32(cd, 0);
        put32(cd, offset);
        cd.extend_from_slice(name.as_bytes());

        self.count += 1;
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        let cd_offset = self.out.len() as u32;
        let cd_size = self.central.len() as u32;
        self.out.extend_from_slice(&self.central);

        let out = &mut self.out;
        out.extend_from_slice(b"PK\x05\x06");
        put16(out, 0);
        put16(out, 0);
        put16(out, self.count);
        put16(out, self.count);
        put32(out, cd_size);
        put32(out, cd_offset);
        put16(out, 0);
        self.out
    }
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Deterministic pseudo-random bytes.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

/// Hands out one byte per read call.
pub struct Trickle<'a>(pub &'a [u8]);

impl Read for Trickle<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let data = self.0;
        match (data.split_first(), out.first_mut()) {
            (Some((byte, rest)), Some(slot)) => {
                *slot = *byte;
                self.0 = rest;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

fn put16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}
