// SPDX-License-Identifier: MIT
//! Binary property list structural parser
//!
//! Parses a `bplist00` buffer into an in-memory object graph. Trailer or
//! offset-table corruption fails the whole parse (no safe root exists);
//! a malformed individual object degrades to [`Value::Null`] so one bad
//! node never aborts extraction of an otherwise-valid document.

use std::collections::{HashMap, HashSet};

use crate::format::{marker, Trailer, BPLIST_MAGIC, MIN_BUFFER_SIZE, TRAILER_SIZE};

/// Errors that are fatal for the whole buffer
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("buffer too small for a binary plist: {0} bytes")]
    TooSmall(usize),

    #[error("missing bplist00 magic")]
    BadMagic,

    #[error("corrupt trailer: {0}")]
    BadTrailer(String),

    #[error("offset table entry {index} points outside the buffer")]
    OffsetOutOfBounds { index: usize },
}

/// Nesting bound for object decoding. Reference chains deeper than this
/// degrade to null instead of exhausting the stack.
const MAX_DEPTH: usize = 512;

/// A decoded plist object
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(u64),
    Real(f64),
    /// Timestamp double, passed through uninterpreted
    Date(f64),
    Data(Vec<u8>),
    /// One-byte-per-character string (ASCII/Latin-1)
    Ascii(String),
    /// Two-bytes-per-code-unit string (UTF-16BE)
    Utf16(String),
    Array(Vec<Value>),
    /// Key/value pairs in encoding order; non-string keys are skipped
    Dict(Vec<(String, Value)>),
}

impl Value {
    /// Get the string content of either string variant
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Ascii(s) | Value::Utf16(s) => Some(s),
            _ => None,
        }
    }

    /// Get the entries of a dictionary value
    #[inline]
    pub fn as_dict(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a dictionary entry by key (first match wins)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dict()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Parse a binary plist buffer into its root object.
///
/// The offset table is built eagerly and fully validated before any
/// object is decoded; a parse never partially succeeds.
pub fn parse(buf: &[u8]) -> Result<Value, ParseError> {
    if buf.len() < MIN_BUFFER_SIZE {
        return Err(ParseError::TooSmall(buf.len()));
    }

    if !buf.starts_with(BPLIST_MAGIC) {
        return Err(ParseError::BadMagic);
    }

    let trailer = Trailer::from_bytes(&buf[buf.len() - TRAILER_SIZE..])
        .map_err(ParseError::BadTrailer)?;
    trailer
        .validate(buf.len())
        .map_err(ParseError::BadTrailer)?;

    let mut parser = Parser::new(buf, &trailer)?;
    Ok(parser.object(trailer.top_object as usize, 0))
}

/// Per-parse decoding state. Memoization and the re-entrancy guard are
/// scoped to one parse call and discarded with it.
struct Parser<'a> {
    buf: &'a [u8],
    offsets: Vec<usize>,
    ref_size: usize,
    cache: HashMap<usize, Value>,
    in_progress: HashSet<usize>,
}

impl<'a> Parser<'a> {
    /// Build the offset table; any out-of-bounds entry aborts the parse
    fn new(buf: &'a [u8], trailer: &Trailer) -> Result<Self, ParseError> {
        let count = trailer.object_count as usize;
        let int_size = trailer.offset_int_size;
        let table = trailer.offset_table_offset as usize;

        let mut offsets = Vec::with_capacity(count);
        for index in 0..count {
            let offset = read_be_uint(buf, table + index * int_size, int_size)
                .ok_or(ParseError::OffsetOutOfBounds { index })? as usize;
            if offset >= buf.len() {
                return Err(ParseError::OffsetOutOfBounds { index });
            }
            offsets.push(offset);
        }

        Ok(Self {
            buf,
            offsets,
            ref_size: trailer.object_ref_size,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
        })
    }

    /// Resolve an object by index, memoized. A self-referential index
    /// (requested again while still decoding) resolves to null instead
    /// of recursing forever.
    fn object(&mut self, index: usize, depth: usize) -> Value {
        if index >= self.offsets.len() || depth > MAX_DEPTH {
            return Value::Null;
        }
        if let Some(cached) = self.cache.get(&index) {
            return cached.clone();
        }
        if !self.in_progress.insert(index) {
            return Value::Null;
        }

        let value = self
            .decode_at(self.offsets[index], depth)
            .unwrap_or(Value::Null);

        self.in_progress.remove(&index);
        self.cache.insert(index, value.clone());
        value
    }

    /// Decode the object whose marker byte sits at `offset`.
    ///
    /// `None` means any malformed or out-of-bounds read; the caller
    /// turns it into [`Value::Null`].
    fn decode_at(&mut self, offset: usize, depth: usize) -> Option<Value> {
        let byte = *self.buf.get(offset)?;
        let high = byte >> 4;
        let low = (byte & 0x0F) as usize;
        let body = offset + 1;

        let value = match high {
            marker::SINGLETON => match low {
                0x0 => Value::Null,
                0x8 => Value::Bool(false),
                0x9 => Value::Bool(true),
                _ => Value::Null,
            },
            marker::INT => Value::Int(read_be_uint(self.buf, body, 1usize << low)?),
            marker::REAL => match 1usize << low {
                4 => {
                    let bits = read_be_uint(self.buf, body, 4)? as u32;
                    Value::Real(f32::from_bits(bits) as f64)
                }
                8 => Value::Real(f64::from_bits(read_be_uint(self.buf, body, 8)?)),
                _ => Value::Null,
            },
            marker::DATE => Value::Date(f64::from_bits(read_be_uint(self.buf, body, 8)?)),
            marker::DATA => {
                let (len, extra) = self.decode_length(offset, low)?;
                let start = body + extra;
                Value::Data(self.buf.get(start..start.checked_add(len)?)?.to_vec())
            }
            marker::ASCII_STRING => {
                let (len, extra) = self.decode_length(offset, low)?;
                let start = body + extra;
                let bytes = self.buf.get(start..start.checked_add(len)?)?;
                Value::Ascii(bytes.iter().map(|&b| b as char).collect())
            }
            marker::UTF16_STRING => {
                let (len, extra) = self.decode_length(offset, low)?;
                let start = body + extra;
                let bytes = self.buf.get(start..start.checked_add(len.checked_mul(2)?)?)?;
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                let decoded: String = char::decode_utf16(units)
                    .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
                    .collect();
                Value::Utf16(decoded)
            }
            marker::ARRAY => {
                let (len, extra) = self.decode_length(offset, low)?;
                let refs = self.object_refs(body + extra, len)?;
                let children = refs
                    .into_iter()
                    .map(|child| self.object(child, depth + 1))
                    .collect();
                Value::Array(children)
            }
            marker::DICT => {
                let (len, extra) = self.decode_length(offset, low)?;
                let keys_start = body + extra;
                let values_start = keys_start.checked_add(len.checked_mul(self.ref_size)?)?;
                let keys = self.object_refs(keys_start, len)?;
                let values = self.object_refs(values_start, len)?;

                let mut entries = Vec::with_capacity(len);
                for (key_index, value_index) in keys.into_iter().zip(values) {
                    // Keys that do not resolve to a string are skipped
                    let key = match self.object(key_index, depth + 1).as_str() {
                        Some(key) => key.to_string(),
                        None => continue,
                    };
                    entries.push((key, self.object(value_index, depth + 1)));
                }
                Value::Dict(entries)
            }
            _ => Value::Null,
        };

        Some(value)
    }

    /// Shared length-encoding rule: a low nibble below 0x0F is the
    /// length itself; 0x0F means the next bytes hold an int-marker
    /// object whose value is the length. Returns the length and the
    /// extra bytes consumed after the marker.
    fn decode_length(&self, offset: usize, low: usize) -> Option<(usize, usize)> {
        if low < 0x0F {
            return Some((low, 0));
        }

        let int_marker = *self.buf.get(offset + 1)?;
        if int_marker >> 4 != marker::INT {
            return None;
        }
        let int_size = 1usize << (int_marker & 0x0F);
        let length = read_be_uint(self.buf, offset + 2, int_size)?;
        Some((usize::try_from(length).ok()?, 1 + int_size))
    }

    /// Read `count` object references of `ref_size` bytes each.
    ///
    /// The whole reference region is bounds-checked before anything is
    /// allocated, so a crafted count cannot balloon memory.
    fn object_refs(&self, start: usize, count: usize) -> Option<Vec<usize>> {
        let end = count
            .checked_mul(self.ref_size)
            .and_then(|len| start.checked_add(len))?;
        if end > self.buf.len() {
            return None;
        }

        let mut refs = Vec::with_capacity(count);
        for i in 0..count {
            let reference = read_be_uint(self.buf, start + i * self.ref_size, self.ref_size)?;
            refs.push(usize::try_from(reference).ok()?);
        }
        Some(refs)
    }
}

/// Read an `nbytes`-wide big-endian unsigned integer, bounds-checked.
///
/// Widths above 8 bytes are unsupported and read as `None`.
fn read_be_uint(buf: &[u8], offset: usize, nbytes: usize) -> Option<u64> {
    if nbytes == 0 || nbytes > 8 {
        return None;
    }
    let bytes = buf.get(offset..offset.checked_add(nbytes)?)?;
    Some(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}
