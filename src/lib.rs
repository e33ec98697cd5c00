// SPDX-License-Identifier: MIT
//! # LaTeXiT Decoder
//!
//! Recovers original LaTeX source text embedded by the LaTeXiT authoring
//! tool inside rendered markdown, so pasted math images can be re-rendered
//! as live math instead of static pictures.
//!
//! ## Pipeline Overview
//!
//! The crate is a pure text-to-text transform. [`rewrite_embedded_math`]
//! scans a markdown document for `<latexit ...>BASE64</latexit>` tags and,
//! for each one, drives a four-stage decode pipeline:
//!
//! 1. **Payload decoding** ([`payload`]): base64 → raw bytes
//! 2. **Decompression** ([`inflate`]): the payload may be a raw-deflate
//!    stream, with or without a 4-byte length prefix, or uncompressed
//! 3. **Structural parsing** ([`plist`]): the bytes are a binary property
//!    list (`bplist00`) holding an object graph
//! 4. **Source extraction** ([`extract`]): the root dictionary's `source`
//!    entry, normalized into inline or block math delimiters
//!
//! Tags whose payload fails at any stage are left untouched; the feature is
//! a best-effort enhancement and never breaks unrelated document rendering.
//!
//! ## Format Specification
//!
//! ```text
//! Binary Property List (bplist00) Format
//! ======================================
//!
//! Header:
//! - Magic: "bplist00" (8 bytes)
//!
//! Objects (variable size, each starting with a marker byte):
//! - High nibble selects the type, low nibble carries the size
//! - 0x0: null / false / true
//! - 0x1: big-endian unsigned int, 2^n payload bytes
//! - 0x2: big-endian IEEE-754 real, 2^n payload bytes
//! - 0x3: date, 8-byte big-endian double
//! - 0x4: raw data bytes
//! - 0x5: ASCII string, one byte per character
//! - 0x6: UTF-16BE string, two bytes per code unit
//! - 0xA: array of object references
//! - 0xD: dictionary (n key refs then n value refs)
//!
//! Offset Table:
//! - One big-endian entry per object, pointing at its marker byte
//!
//! Trailer (32 bytes, at end of buffer):
//! - Offset entry size (byte 6), object reference size (byte 7)
//! - Object count, top object index, offset table offset (big-endian u64)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use latexit_decoder::rewrite_embedded_math;
//!
//! let markdown = "Euler: <latexit sha1_base64=\"...\">not-a-payload</latexit>";
//! // Undecodable tags pass through unchanged.
//! assert_eq!(rewrite_embedded_math(markdown), markdown);
//!
//! let plain = "No embedded tags here.";
//! assert_eq!(rewrite_embedded_math(plain), plain);
//! ```

pub mod extract;
pub mod format;
pub mod inflate;
pub mod payload;
pub mod plist;
pub mod rewrite;

// Re-export main types
pub use extract::extract_source;
pub use format::{Trailer, BPLIST_MAGIC, MIN_BUFFER_SIZE, TRAILER_SIZE};
pub use payload::{decode_base64, DecodeError};
pub use plist::{parse, ParseError, Value};
pub use rewrite::{decode_latexit_payload, rewrite_embedded_math};
