// SPDX-License-Identifier: MIT
//! Binary property list (bplist00) format specification
//!
//! Defines the fixed structures of the binary plist v00 layout: magic
//! bytes, the 32-byte trailer, and the object marker type nibbles.

/// bplist format magic bytes
pub const BPLIST_MAGIC: &[u8; 8] = b"bplist00";

/// Trailer size in bytes
pub const TRAILER_SIZE: usize = 32;

/// Smallest buffer that can hold a magic, one object and a trailer
pub const MIN_BUFFER_SIZE: usize = 40;

/// Object marker high nibbles
pub mod marker {
    /// Null, booleans
    pub const SINGLETON: u8 = 0x0;

    /// Big-endian unsigned integer
    pub const INT: u8 = 0x1;

    /// Big-endian IEEE-754 real
    pub const REAL: u8 = 0x2;

    /// 8-byte big-endian double timestamp
    pub const DATE: u8 = 0x3;

    /// Raw data bytes
    pub const DATA: u8 = 0x4;

    /// One byte per character, ASCII/Latin-1
    pub const ASCII_STRING: u8 = 0x5;

    /// Two bytes per code unit, UTF-16BE
    pub const UTF16_STRING: u8 = 0x6;

    /// Ordered object references
    pub const ARRAY: u8 = 0xA;

    /// Paired key/value object references
    pub const DICT: u8 = 0xD;
}

/// bplist trailer (32 bytes at the end of the buffer)
///
/// The first five bytes are unused padding; byte 5 is a sort version
/// this subsystem ignores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {
    /// Bytes per offset table entry (1-8)
    pub offset_int_size: usize,

    /// Bytes per object reference (1-8)
    pub object_ref_size: usize,

    /// Total number of objects
    pub object_count: u64,

    /// Index of the root object
    pub top_object: u64,

    /// Byte offset of the offset table
    pub offset_table_offset: u64,
}

impl Trailer {
    /// Parse a trailer from the final [`TRAILER_SIZE`] bytes of a buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() != TRAILER_SIZE {
            return Err(format!(
                "Trailer must be {} bytes, got {}",
                TRAILER_SIZE,
                bytes.len()
            ));
        }

        // Read fields directly from bytes (big-endian)
        let offset_int_size = bytes[6] as usize;
        let object_ref_size = bytes[7] as usize;
        let object_count = u64::from_be_bytes(bytes[8..16].try_into().unwrap());
        let top_object = u64::from_be_bytes(bytes[16..24].try_into().unwrap());
        let offset_table_offset = u64::from_be_bytes(bytes[24..32].try_into().unwrap());

        Ok(Self {
            offset_int_size,
            object_ref_size,
            object_count,
            top_object,
            offset_table_offset,
        })
    }

    /// Validate the trailer against the full buffer length.
    ///
    /// Enforces `offset_table_offset + object_count * offset_int_size <=
    /// trailer_offset`; a violation means the buffer is not a valid
    /// binary plist and no safe root exists.
    pub fn validate(&self, buffer_len: usize) -> Result<(), String> {
        if self.offset_int_size == 0 || self.offset_int_size > 8 {
            return Err(format!(
                "Offset entry size must be 1-8 bytes, got {}",
                self.offset_int_size
            ));
        }

        if self.object_ref_size == 0 || self.object_ref_size > 8 {
            return Err(format!(
                "Object reference size must be 1-8 bytes, got {}",
                self.object_ref_size
            ));
        }

        if self.object_count == 0 {
            return Err("Object count is zero".to_string());
        }

        if self.top_object >= self.object_count {
            return Err(format!(
                "Top object {} out of range ({} objects)",
                self.top_object, self.object_count
            ));
        }

        let trailer_offset = buffer_len
            .checked_sub(TRAILER_SIZE)
            .ok_or_else(|| format!("Buffer of {buffer_len} bytes cannot hold a trailer"))?
            as u64;
        let table_end = self
            .object_count
            .checked_mul(self.offset_int_size as u64)
            .and_then(|len| self.offset_table_offset.checked_add(len))
            .ok_or_else(|| "Offset table length overflows".to_string())?;

        if self.offset_table_offset < BPLIST_MAGIC.len() as u64 || table_end > trailer_offset {
            return Err(format!(
                "Offset table [{}, {}) outside object region [8, {})",
                self.offset_table_offset, table_end, trailer_offset
            ));
        }

        Ok(())
    }
}
