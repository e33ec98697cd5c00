// SPDX-License-Identifier: MIT
//! Markdown tag scanning and substitution
//!
//! Finds `<latexit ...>BASE64</latexit>` tags, drives the decode
//! pipeline per match, and substitutes recovered math back into the
//! document. Every failure is absorbed at this boundary: a tag that
//! cannot be decoded stays byte-for-byte as it was, so a bad payload
//! never breaks unrelated rendering.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::{extract, inflate, payload, plist};

/// Cached tag pattern: case-insensitive, non-greedy payload, `.`
/// spanning newlines for line-wrapped base64
static LATEXIT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<latexit\b[^>]*>(.*?)</latexit>").expect("Invalid latexit tag regex")
});

/// Rewrite every decodable embedded-metadata tag in a markdown document
/// into math notation.
///
/// Tags are processed strictly in document order, one at a time, so
/// substitutions never reorder and peak memory stays at one decoded
/// object graph. Returns the input borrowed when it contains no tag.
pub fn rewrite_embedded_math(markdown: &str) -> Cow<'_, str> {
    let mut matches = LATEXIT_TAG.captures_iter(markdown).peekable();
    if matches.peek().is_none() {
        return Cow::Borrowed(markdown);
    }

    let mut out = String::with_capacity(markdown.len());
    let mut tail = 0;
    for captures in matches {
        let span = captures.get(0).expect("capture group 0 always exists");
        let payload = captures.get(1).map_or("", |p| p.as_str());

        out.push_str(&markdown[tail..span.start()]);
        match decode_latexit_payload(payload) {
            Some(math) => out.push_str(&math),
            None => out.push_str(span.as_str()),
        }
        tail = span.end();
    }
    out.push_str(&markdown[tail..]);

    Cow::Owned(out)
}

/// Run one tag payload through the full pipeline: base64 → candidate
/// decompression → structural parse → source extraction.
///
/// Candidates are tried in priority order; the first one that parses
/// and yields a usable source wins. `None` means the tag stays as-is.
pub fn decode_latexit_payload(payload: &str) -> Option<String> {
    let raw = match payload::decode_base64(payload) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(%err, "tag payload is not valid base64");
            return None;
        }
    };

    for candidate in inflate::candidates(&raw) {
        match plist::parse(&candidate) {
            Ok(root) => {
                if let Some(math) = extract::extract_source(&root) {
                    return Some(math);
                }
                debug!("parsed property list has no usable source entry");
            }
            Err(err) => trace!(%err, "candidate buffer is not a binary plist"),
        }
    }

    debug!("no candidate produced a source, leaving tag untouched");
    None
}
