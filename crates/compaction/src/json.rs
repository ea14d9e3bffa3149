//! Brace-balanced JSON extraction from free text.
//!
//! Tool results are sometimes embedded in prose (`Tool 'readNote' result:
//! {...}`), so the JSON object has to be sliced out by tracking brace depth
//! rather than by pattern matching. The scan is a single linear pass over
//! the bytes; characters inside double-quoted strings are opaque, with
//! backslash escapes (including escaped quotes) respected.

/// A balanced JSON object sliced out of surrounding text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancedJson<'a> {
    /// The object text, from `{` through the matching `}` inclusive.
    pub json: &'a str,
    /// Byte offset just past the closing brace.
    pub end: usize,
}

/// Extract the balanced JSON object starting at byte offset `start`.
///
/// Returns `None` when `content[start]` is not `{` or the braces never
/// balance before the input ends. Offsets are byte offsets; braces, quotes,
/// and backslashes are ASCII, so the byte scan is UTF-8 safe.
pub fn extract_balanced_json(content: &str, start: usize) -> Option<BalancedJson<'_>> {
    let bytes = content.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(BalancedJson {
                        json: &content[start..=offset],
                        end: offset + 1,
                    });
                }
            }
            _ => {}
        }
    }

    None
}
