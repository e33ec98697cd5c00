// SPDX-License-Identifier: MIT
//! Best-effort raw-deflate decompression of decoded payloads
//!
//! LaTeXiT payloads come in three shapes: a 4-byte big-endian length
//! prefix followed by a raw-deflate stream, a bare raw-deflate stream,
//! or uncompressed plist bytes. The adapter produces every plausible
//! candidate in priority order and lets the structural parser decide
//! which one is real.

use std::io::Read;

use flate2::read::DeflateDecoder;
use tracing::trace;

/// Upper bound on decompressed output, so a hostile payload cannot
/// balloon memory. Candidates that hit the cap are dropped.
pub const MAX_INFLATED_SIZE: usize = 16 * 1024 * 1024;

/// Produce candidate buffers for structural parsing, in priority order:
///
/// 1. If the first 4 bytes, read big-endian, equal `len - 4`, the
///    inflation of `data[4..]`
/// 2. The inflation of the entire buffer
/// 3. The original bytes unchanged (covers uncompressed payloads)
///
/// Failed inflation attempts are dropped silently; the list always
/// contains at least the original bytes.
pub fn candidates(data: &[u8]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();

    if data.len() > 4 {
        let declared = u32::from_be_bytes(data[0..4].try_into().unwrap()) as usize;
        if declared == data.len() - 4 {
            if let Some(inflated) = inflate_raw(&data[4..]) {
                out.push(inflated);
            }
        }
    }

    if let Some(inflated) = inflate_raw(data) {
        out.push(inflated);
    }

    out.push(data.to_vec());
    out
}

/// Inflate a raw-deflate stream with optimized capacity estimation.
///
/// Returns `None` on any decoder error, when the output exceeds
/// [`MAX_INFLATED_SIZE`], or when it is empty (an empty buffer can
/// never be a plist, so it is useless as a candidate).
fn inflate_raw(data: &[u8]) -> Option<Vec<u8>> {
    // Deflate typically achieves 2-4x compression on LaTeX source
    let estimated_size = data.len().saturating_mul(3).max(1024);
    let mut inflated = Vec::with_capacity(estimated_size.min(MAX_INFLATED_SIZE));

    let mut decoder = DeflateDecoder::new(data).take(MAX_INFLATED_SIZE as u64 + 1);
    if let Err(err) = decoder.read_to_end(&mut inflated) {
        trace!(%err, "deflate candidate dropped");
        return None;
    }

    if inflated.len() > MAX_INFLATED_SIZE {
        trace!(len = inflated.len(), "deflate candidate exceeds size cap");
        return None;
    }

    // Some decoder backends accept degenerate input and produce nothing
    if inflated.is_empty() {
        trace!("deflate candidate inflated to nothing");
        return None;
    }

    Some(inflated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_uncompressed_data_survives_as_last_candidate() {
        let data = b"bplist00-ish bytes".to_vec();
        let candidates = candidates(&data);
        assert_eq!(candidates.last().unwrap(), &data);
    }

    #[test]
    fn test_whole_buffer_deflate_candidate() {
        let original = b"E = mc^2, repeated enough to compress: E = mc^2 E = mc^2";
        let compressed = deflate(original);

        let candidates = candidates(&compressed);
        assert!(candidates.iter().any(|c| c == original));
    }

    #[test]
    fn test_length_prefixed_deflate_candidate_comes_first() {
        let original = b"\\frac{a}{b} + \\frac{c}{d}";
        let compressed = deflate(original);

        let mut prefixed = Vec::new();
        prefixed.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
        prefixed.extend_from_slice(&compressed);

        let candidates = candidates(&prefixed);
        assert_eq!(candidates[0], original);
    }

    #[test]
    fn test_wrong_length_prefix_is_ignored() {
        let original = b"x^2 + y^2 = z^2";
        let compressed = deflate(original);

        let mut prefixed = Vec::new();
        prefixed.extend_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
        prefixed.extend_from_slice(&compressed);

        // Prefix does not match, so only the whole-buffer attempt and the
        // original bytes remain.
        let candidates = candidates(&prefixed);
        assert!(!candidates.iter().any(|c| c == original));
        assert_eq!(candidates.last().unwrap(), &prefixed);
    }

    #[test]
    fn test_tiny_buffer_yields_only_original() {
        // Some backends inflate degenerate zero bytes to empty output
        // instead of erroring; that must not surface as a candidate.
        let data = [0u8; 3];
        let candidates = candidates(&data);
        assert_eq!(candidates, vec![data.to_vec()]);
    }

    #[test]
    fn test_empty_inflation_output_is_not_a_candidate() {
        // A valid deflate stream of zero bytes inflates successfully
        // but produces nothing; only the original may remain.
        let compressed = deflate(b"");
        let candidates = candidates(&compressed);
        assert!(candidates.iter().all(|c| !c.is_empty()));
        assert_eq!(candidates.last().unwrap(), &compressed);
    }
}
