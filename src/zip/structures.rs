use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::borrow::Cow;
use std::io::Cursor;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Digital signature record that may close the central directory
pub const DIGITAL_SIGNATURE: &[u8] = b"PK\x05\x05";
pub const DIGITAL_SIGNATURE_MIN_SIZE: usize = 6;

/// End of Central Directory (EOCD) - 22 bytes minimum
pub const EOCD_SIGNATURE: &[u8] = b"PK\x05\x06";
pub const EOCD_MIN_SIZE: usize = 22;

/// Optional marker in front of a data descriptor
pub const DATA_DESCRIPTOR_SIGNATURE: &[u8] = b"PK\x07\x08";

/// Prefix shared by every record signature; the scanners search for this.
pub const SIGNATURE_PREFIX: &[u8] = b"PK";
pub const SIGNATURE_LEN: usize = 4;

/// Smallest tail that can still hold a directory entry plus the end record.
///
/// Fewer buffered bytes than this at end of input, with no signature at the
/// current position, is reported as end of archive. This is a heuristic: an
/// archive padded with junk shorter than this can trip it either way.
pub const MIN_TRAILER_LEN: usize = CDFH_MIN_SIZE + EOCD_MIN_SIZE;

/// General purpose flag: entry is encrypted
pub const FLAG_ENCRYPTED: u16 = 0x0001;
/// General purpose flag: crc and sizes follow the data in a descriptor
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// Local file header as found in front of each entry's data.
///
/// When [`has_data_descriptor`](Self::has_data_descriptor) is set, the crc
/// and size fields read from the stream are placeholders; the reader fills
/// them in from the descriptor once the entry's data has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name: Vec<u8>,
    pub extra: Vec<u8>,
}

impl LocalFileHeader {
    /// Parse the fixed part of a local file header.
    ///
    /// `data` must start at the signature. Returns the header with empty
    /// name and extra fields, plus the lengths of those two fields.
    pub fn from_bytes(data: &[u8; LFH_SIZE]) -> std::io::Result<(Self, u16, u16)> {
        let mut cursor = Cursor::new(&data[SIGNATURE_LEN..]);

        let header = Self {
            version_needed: cursor.read_u16::<LittleEndian>()?,
            flags: cursor.read_u16::<LittleEndian>()?,
            compression_method: CompressionMethod::from_u16(cursor.read_u16::<LittleEndian>()?),
            last_mod_time: cursor.read_u16::<LittleEndian>()?,
            last_mod_date: cursor.read_u16::<LittleEndian>()?,
            crc32: cursor.read_u32::<LittleEndian>()?,
            compressed_size: cursor.read_u32::<LittleEndian>()?,
            uncompressed_size: cursor.read_u32::<LittleEndian>()?,
            name: Vec::new(),
            extra: Vec::new(),
        };
        let name_len = cursor.read_u16::<LittleEndian>()?;
        let extra_len = cursor.read_u16::<LittleEndian>()?;

        Ok((header, name_len, extra_len))
    }

    /// Entry name, with invalid UTF-8 replaced
    pub fn file_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Directory entries end with '/'
    pub fn is_directory(&self) -> bool {
        self.name.ends_with(b"/")
    }

    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    /// Encryption is not supported; this is informational only.
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    pub(crate) fn apply_descriptor(&mut self, descriptor: &DataDescriptor) {
        self.crc32 = descriptor.crc32;
        self.compressed_size = descriptor.compressed_size;
        self.uncompressed_size = descriptor.uncompressed_size;
    }
}

/// Data descriptor trailing a streamed entry - 12 bytes, 16 with marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl DataDescriptor {
    pub const SIZE: usize = 12;
    pub const SIZE_WITH_SIGNATURE: usize = Self::SIZE + SIGNATURE_LEN;

    /// Parse the three fields, skipping the marker if `data` starts with one.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let fields = if data.starts_with(DATA_DESCRIPTOR_SIGNATURE) {
            data.get(SIGNATURE_LEN..Self::SIZE_WITH_SIGNATURE)?
        } else {
            data.get(..Self::SIZE)?
        };

        Some(Self {
            crc32: LittleEndian::read_u32(&fields[0..4]),
            compressed_size: LittleEndian::read_u32(&fields[4..8]),
            uncompressed_size: LittleEndian::read_u32(&fields[8..12]),
        })
    }
}

/// Which record a signature at the current position introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Record {
    LocalFile,
    Directory,
}

impl Record {
    pub(crate) fn at(data: &[u8]) -> Option<Self> {
        let sig = data.get(..SIGNATURE_LEN)?;
        if sig == LFH_SIGNATURE {
            Some(Record::LocalFile)
        } else if sig == CDFH_SIGNATURE || sig == DIGITAL_SIGNATURE || sig == EOCD_SIGNATURE {
            Some(Record::Directory)
        } else {
            None
        }
    }
}
