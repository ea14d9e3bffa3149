//! Tag-span scanning and XML helpers for tool-result blocks.
//!
//! Tool results arrive as XML-ish envelopes (`<note_context>…</note_context>`)
//! with simple child elements (`<path>`, `<url>`, `<name>`, `<content>`).
//! Spans of a given tag are assumed never to nest or overlap within one
//! message; matching is first-open to nearest-close.
//!
//! The per-tag span patterns are compiled once into an immutable table at
//! first use and shared by all callers.

use contextfold_core::registry::{SourceExtractor, SourceType};
use regex_lite::Regex;
use std::sync::LazyLock;

/// Tags whose embedded tool-result blocks are scanned for compaction.
pub const SCANNABLE_TAGS: &[&str] = &[
    "localSearch",
    "note_context",
    "active_note",
    "retrieved_document",
    "url_content",
    "youtube_video_context",
];

/// Write-once tag→pattern table. `regex-lite` guarantees linear-time
/// matching, so the lazy `.*?` span body cannot backtrack catastrophically.
pub static TAG_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SCANNABLE_TAGS
        .iter()
        .map(|tag| (*tag, span_pattern(tag)))
        .collect()
});

fn span_pattern(tag: &str) -> Regex {
    // Opening tag with optional attributes, body, nearest closing tag.
    Regex::new(&format!(r"(?s)<{tag}(?:\s[^>]*)?>.*?</{tag}>"))
        .expect("tag span pattern is statically valid")
}

/// First `<name>…</name>` child's inner text, trimmed.
pub fn extract_child<'a>(block: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = block.find(&open)? + open.len();
    let len = block[start..].find(&close)?;
    Some(block[start..start + len].trim())
}

/// The source identifier for a block, using its registered extractor with a
/// path → url → name fallback chain.
pub fn extract_source(block: &str, extractor: SourceExtractor) -> Option<String> {
    let preferred = match extractor {
        SourceExtractor::Path => extract_child(block, "path"),
        SourceExtractor::Url => extract_child(block, "url"),
        SourceExtractor::Name => extract_child(block, "name"),
        SourceExtractor::None => None,
    };
    preferred
        .or_else(|| extract_child(block, "path"))
        .or_else(|| extract_child(block, "url"))
        .or_else(|| extract_child(block, "name"))
        .map(str::to_string)
}

/// Escape a string for embedding as an XML attribute value.
pub fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Wrap compacted content in the `<prior_context>` envelope.
pub fn prior_context_envelope(source: &str, source_type: SourceType, body: &str) -> String {
    format!(
        "<prior_context source=\"{}\" type=\"{}\">\n{body}\n</prior_context>",
        escape_attr(source),
        source_type.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_cover_every_scannable_tag() {
        assert_eq!(TAG_PATTERNS.len(), SCANNABLE_TAGS.len());
        for (tag, pattern) in TAG_PATTERNS.iter() {
            let sample = format!("<{tag}>body</{tag}>");
            assert!(pattern.is_match(&sample), "pattern for {tag} must match");
        }
    }

    #[test]
    fn span_matches_tag_with_attributes() {
        let (_, pattern) = TAG_PATTERNS
            .iter()
            .find(|(tag, _)| *tag == "note_context")
            .unwrap();
        let text = r#"before <note_context id="7">inner</note_context> after"#;
        let m = pattern.find(text).unwrap();
        assert_eq!(m.as_str(), r#"<note_context id="7">inner</note_context>"#);
    }

    #[test]
    fn span_does_not_match_prefix_tags() {
        // <note_context_extra> must not be mistaken for <note_context>.
        let (_, pattern) = TAG_PATTERNS
            .iter()
            .find(|(tag, _)| *tag == "note_context")
            .unwrap();
        let text = "<note_context_extra>inner</note_context_extra>";
        assert!(pattern.find(text).is_none());
    }

    #[test]
    fn extract_child_takes_first_occurrence() {
        let block = "<note_context><path> a.md </path><path>b.md</path></note_context>";
        assert_eq!(extract_child(block, "path"), Some("a.md"));
        assert_eq!(extract_child(block, "title"), None);
    }

    #[test]
    fn extract_source_fallback_chain() {
        let block = "<x><url>https://example.com</url></x>";
        // Path extractor configured, no <path> child — falls back to <url>.
        assert_eq!(
            extract_source(block, SourceExtractor::Path),
            Some("https://example.com".to_string())
        );
        assert_eq!(extract_source("<x>nothing</x>", SourceExtractor::None), None);
    }

    #[test]
    fn attribute_escaping() {
        assert_eq!(
            escape_attr(r#"a&b<c>d"e"#),
            "a&amp;b&lt;c&gt;d&quot;e"
        );
    }

    #[test]
    fn envelope_shape() {
        let out = prior_context_envelope("notes/a & b.md", SourceType::Note, "BODY");
        assert_eq!(
            out,
            "<prior_context source=\"notes/a &amp; b.md\" type=\"note\">\nBODY\n</prior_context>"
        );
    }
}
