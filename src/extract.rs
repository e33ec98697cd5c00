// SPDX-License-Identifier: MIT
//! LaTeX source extraction from a parsed object graph

use crate::plist::Value;

/// Pull the LaTeX source out of a parsed plist root and normalize it
/// into math-ready markdown.
///
/// Succeeds only when the root is a dictionary whose `source` entry is
/// a non-empty string after trimming. Sources that already carry math
/// delimiters pass through unchanged; otherwise multi-line sources wrap
/// as block math and single-line sources as inline math.
pub fn extract_source(root: &Value) -> Option<String> {
    let source = root.get("source")?.as_str()?.trim();
    if source.is_empty() {
        return None;
    }
    Some(normalize_math(source))
}

fn normalize_math(source: &str) -> String {
    if is_delimited(source) {
        source.to_string()
    } else if source.contains('\n') {
        format!("$$\n{source}\n$$")
    } else {
        format!("${source}$")
    }
}

/// Recognized delimiter pairs: `$...$` (which also covers `$$...$$`),
/// `\(...\)` and `\[...\]`
fn is_delimited(source: &str) -> bool {
    (source.len() >= 2 && source.starts_with('$') && source.ends_with('$'))
        || (source.starts_with("\\(") && source.ends_with("\\)"))
        || (source.starts_with("\\[") && source.ends_with("\\]"))
}
