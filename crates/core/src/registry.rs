//! Block registry — classification of embedded context-block tags.
//!
//! Every tool-produced content block carries an XML-ish tag (`<note_context>`,
//! `<url_content>`, …). The registry maps each tag to its source type, whether
//! the original content is recoverable on demand (and therefore safe to
//! compact), and how to extract the block's source identifier.
//!
//! The table is a `const` — created once, never mutated, readable from any
//! thread. Unknown tags are treated as non-recoverable: it is always safer to
//! under-compact than to destroy content the model cannot re-fetch.

use serde::{Deserialize, Serialize};

/// Where a content block originally came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Note,
    Url,
    Youtube,
    Pdf,
    SelectedText,
    Unknown,
}

impl SourceType {
    /// Wire name used in the `type` attribute of `<prior_context>` envelopes.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Note => "note",
            SourceType::Url => "url",
            SourceType::Youtube => "youtube",
            SourceType::Pdf => "pdf",
            SourceType::SelectedText => "selected_text",
            SourceType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which child element holds a block's source identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceExtractor {
    /// `<path>` child (vault notes).
    Path,
    /// `<url>` child (web pages, videos).
    Url,
    /// `<name>` child (embedded files).
    Name,
    /// No per-block source (e.g. per-document sources inside localSearch).
    None,
}

/// Classification record for one content-block tag.
#[derive(Debug, Clone, Copy)]
pub struct ContextBlockType {
    pub tag: &'static str,
    pub source_type: SourceType,
    pub recoverable: bool,
    pub extractor: SourceExtractor,
}

/// The full classification table.
///
/// Selected text is the one source the model can never re-fetch — the user's
/// selection is gone once the turn ends — so it is never compacted.
const BLOCK_TYPES: &[ContextBlockType] = &[
    ContextBlockType {
        tag: "note_context",
        source_type: SourceType::Note,
        recoverable: true,
        extractor: SourceExtractor::Path,
    },
    ContextBlockType {
        tag: "active_note",
        source_type: SourceType::Note,
        recoverable: true,
        extractor: SourceExtractor::Path,
    },
    ContextBlockType {
        tag: "embedded_note",
        source_type: SourceType::Note,
        recoverable: true,
        extractor: SourceExtractor::Path,
    },
    ContextBlockType {
        tag: "vault_note",
        source_type: SourceType::Note,
        recoverable: true,
        extractor: SourceExtractor::Path,
    },
    ContextBlockType {
        tag: "retrieved_document",
        source_type: SourceType::Note,
        recoverable: true,
        extractor: SourceExtractor::Path,
    },
    ContextBlockType {
        tag: "url_content",
        source_type: SourceType::Url,
        recoverable: true,
        extractor: SourceExtractor::Url,
    },
    ContextBlockType {
        tag: "web_tab_context",
        source_type: SourceType::Url,
        recoverable: true,
        extractor: SourceExtractor::Url,
    },
    ContextBlockType {
        tag: "active_web_tab",
        source_type: SourceType::Url,
        recoverable: true,
        extractor: SourceExtractor::Url,
    },
    ContextBlockType {
        tag: "youtube_video_context",
        source_type: SourceType::Youtube,
        recoverable: true,
        extractor: SourceExtractor::Url,
    },
    ContextBlockType {
        tag: "embedded_pdf",
        source_type: SourceType::Pdf,
        recoverable: true,
        extractor: SourceExtractor::Name,
    },
    ContextBlockType {
        tag: "selected_text",
        source_type: SourceType::SelectedText,
        recoverable: false,
        extractor: SourceExtractor::None,
    },
    ContextBlockType {
        tag: "web_selected_text",
        source_type: SourceType::SelectedText,
        recoverable: false,
        extractor: SourceExtractor::None,
    },
    ContextBlockType {
        tag: "localSearch",
        source_type: SourceType::Note,
        recoverable: true,
        extractor: SourceExtractor::None,
    },
];

/// Look up the classification record for a tag.
pub fn lookup(tag: &str) -> Option<&'static ContextBlockType> {
    BLOCK_TYPES.iter().find(|block| block.tag == tag)
}

/// Whether a tag's content can be re-fetched on demand.
///
/// Unknown tags are non-recoverable.
pub fn is_recoverable(tag: &str) -> bool {
    lookup(tag).is_some_and(|block| block.recoverable)
}

/// The source type for a tag. Unknown tags map to [`SourceType::Unknown`].
pub fn source_type_of(tag: &str) -> SourceType {
    lookup(tag).map_or(SourceType::Unknown, |block| block.source_type)
}

/// All registered tags that must never be compacted.
pub fn never_compact_tags() -> Vec<&'static str> {
    BLOCK_TYPES
        .iter()
        .filter(|block| !block.recoverable)
        .map(|block| block.tag)
        .collect()
}
