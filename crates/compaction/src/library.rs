//! Turn-to-library compactor.
//!
//! When a turn completes, its attached context is folded into the cumulative
//! context library carried in the L2 prompt layer. Oversized content is
//! compacted into a `<prior_context>` envelope; the model recovers the full
//! form on demand using the refetch instruction appended once per request.

use contextfold_core::registry::{ContextBlockType, SourceType};
use contextfold_core::CompactionConfig;
use tracing::debug;

use crate::text::compact_by_section;
use crate::xml::{extract_child, extract_source, prior_context_envelope};

/// Compact one piece of turn context into a library entry.
///
/// Content at or under the verbatim threshold is returned unchanged;
/// anything larger is compacted by section and wrapped in a
/// `<prior_context>` envelope carrying its source and type.
pub fn compact_turn_context(
    content: &str,
    source: &str,
    source_type: SourceType,
    config: &CompactionConfig,
) -> String {
    if content.chars().count() <= config.verbatim_threshold {
        return content.to_string();
    }

    let compacted = compact_by_section(
        content,
        config.preview_chars_per_section,
        config.max_sections,
    );
    debug!(
        source,
        source_type = source_type.as_str(),
        original_chars = content.chars().count(),
        compacted_chars = compacted.chars().count(),
        "folded turn context into library entry"
    );
    prior_context_envelope(source, source_type, &compacted)
}

/// Compact a full tool-result XML block for the library.
///
/// Non-recoverable block types and blocks under the threshold are returned
/// unchanged; otherwise the block's source and `<content>` child (the whole
/// block when absent) are extracted and delegated to
/// [`compact_turn_context`].
pub fn compact_xml_block(
    block: &str,
    block_type: &ContextBlockType,
    config: &CompactionConfig,
) -> String {
    if !block_type.recoverable || block.chars().count() < config.verbatim_threshold {
        return block.to_string();
    }

    let source =
        extract_source(block, block_type.extractor).unwrap_or_else(|| block_type.tag.to_string());
    let content = extract_child(block, "content").unwrap_or(block);

    compact_turn_context(content, &source, block_type.source_type, config)
}

/// The fixed instruction telling the model how to recover compacted context.
/// Appended once per request, not once per compacted item.
pub fn refetch_instruction() -> &'static str {
    "<prior_context_note>\n\
     Some earlier context appears in compacted form inside <prior_context> blocks. \
     The full content is recoverable on demand:\n\
     - type=\"note\": open the note by its [[bracketed title]] or read it again by its path\n\
     - type=\"url\": re-fetch the page with the web content tool using the original URL\n\
     - type=\"youtube\": re-fetch the transcript with the video tool using the original URL\n\
     Only re-fetch when the compacted preview is not enough for the current request.\n\
     </prior_context_note>"
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextfold_core::registry;

    fn test_config() -> CompactionConfig {
        CompactionConfig::default()
            .with_verbatim_threshold(500)
            .with_preview_chars(80)
            .with_max_sections(4)
    }

    #[test]
    fn small_content_is_untouched() {
        let config = test_config();
        let content = "a short note body";
        assert_eq!(
            compact_turn_context(content, "notes/a.md", SourceType::Note, &config),
            content
        );
    }

    #[test]
    fn oversized_content_gets_enveloped() {
        let config = test_config();
        let content = format!("# Heading\n{}", "sentence of text. ".repeat(100));

        let out = compact_turn_context(&content, "notes/a.md", SourceType::Note, &config);
        assert!(out.starts_with("<prior_context source=\"notes/a.md\" type=\"note\">"));
        assert!(out.ends_with("</prior_context>"));
        assert!(out.contains("# Heading"));
        assert!(out.len() < content.len());
    }

    #[test]
    fn source_is_attribute_escaped() {
        let config = test_config();
        let content = "x".repeat(1000);
        let out = compact_turn_context(&content, "notes/a&b.md", SourceType::Note, &config);
        assert!(out.contains("source=\"notes/a&amp;b.md\""));
    }

    #[test]
    fn non_recoverable_block_type_is_unchanged() {
        let config = test_config();
        let block_type = registry::lookup("selected_text").unwrap();
        let block = format!("<selected_text>{}</selected_text>", "A".repeat(20_000));
        assert_eq!(compact_xml_block(&block, block_type, &config), block);
    }

    #[test]
    fn xml_block_under_threshold_is_unchanged() {
        let config = test_config();
        let block_type = registry::lookup("note_context").unwrap();
        let block = "<note_context><path>a.md</path><content>small</content></note_context>";
        assert_eq!(compact_xml_block(block, block_type, &config), block);
    }

    #[test]
    fn xml_block_over_threshold_delegates() {
        let config = test_config();
        let block_type = registry::lookup("url_content").unwrap();
        let block = format!(
            "<url_content><url>https://example.com/page</url><content>{}</content></url_content>",
            "web page text. ".repeat(100)
        );

        let out = compact_xml_block(&block, block_type, &config);
        assert!(out.contains("source=\"https://example.com/page\""));
        assert!(out.contains("type=\"url\""));
        assert!(out.len() < block.len());
    }

    #[test]
    fn refetch_instruction_is_fixed() {
        let instruction = refetch_instruction();
        assert!(instruction.starts_with("<prior_context_note>"));
        assert!(instruction.ends_with("</prior_context_note>"));
        assert!(instruction.contains("[[bracketed title]]"));
        // Same block every call — appended once per request by the caller.
        assert_eq!(instruction, refetch_instruction());
    }
}
