//! Assistant-output compactor.
//!
//! Runs over an assistant message immediately before it is persisted to
//! durable chat history. Oversized tool-result blocks embedded in the text
//! are replaced with compact `<prior_context>` forms the model can expand
//! again on demand; everything under the verbatim threshold — and every
//! block whose source is not recoverable — is left byte-identical.
//!
//! No input shape makes this module error: unexpected shapes pass through
//! unchanged.

use contextfold_core::CompactionConfig;
use contextfold_core::registry::{self, SourceType};
use serde_json::Value;
use tracing::debug;

use crate::json::extract_balanced_json;
use crate::text::compact_by_section;
use crate::xml::{TAG_PATTERNS, extract_child, extract_source, prior_context_envelope};

/// Protocol marker preceding an embedded readNote JSON result.
///
/// This literal is an external contract owned by the tool-formatting layer;
/// if that layer's output format changes, this marker must change in
/// lockstep.
pub const READ_NOTE_MARKER: &str = "Tool 'readNote' result: ";

/// Prefix prepended to a compacted readNote `content` field.
pub const READ_NOTE_COMPACTED_PREFIX: &str = "[COMPACTED - use readNote to get full content]\n\n";

/// Compact an assistant output of any shape.
///
/// Strings are compacted directly. Arrays are treated as multimodal content
/// parts: parts with `"type": "text"` have their `"text"` field compacted,
/// every other part is cloned unchanged. Any other shape passes through
/// unchanged.
pub fn compact_assistant_output(output: &Value, config: &CompactionConfig) -> Value {
    match output {
        Value::String(text) => Value::String(compact_output_string(text, config)),
        Value::Array(parts) => Value::Array(
            parts
                .iter()
                .map(|part| compact_content_part(part, config))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn compact_content_part(part: &Value, config: &CompactionConfig) -> Value {
    if part.get("type").and_then(Value::as_str) != Some("text") {
        return part.clone();
    }
    let Some(text) = part.get("text").and_then(Value::as_str) else {
        return part.clone();
    };

    let compacted = compact_output_string(text, config);
    let mut new_part = part.clone();
    if let Value::Object(map) = &mut new_part {
        map.insert("text".into(), Value::String(compacted));
    }
    new_part
}

/// Compact one assistant text: replace oversized tool-result tag spans, then
/// rewrite oversized embedded readNote JSON results.
pub fn compact_output_string(content: &str, config: &CompactionConfig) -> String {
    let after_tags = replace_tag_spans(content, config);
    replace_read_note_results(&after_tags, config)
}

fn replace_tag_spans(content: &str, config: &CompactionConfig) -> String {
    let mut current = content.to_string();

    for (tag, pattern) in TAG_PATTERNS.iter() {
        // Guard: a non-recoverable tag must never be rewritten, even if it
        // were accidentally added to the scannable set.
        if !registry::is_recoverable(tag) {
            continue;
        }
        if !current.contains(&format!("<{tag}")) {
            continue;
        }

        let mut out = String::with_capacity(current.len());
        let mut last = 0;
        for found in pattern.find_iter(&current) {
            out.push_str(&current[last..found.start()]);
            let span = found.as_str();
            if span.chars().count() >= config.verbatim_threshold {
                let replacement = compact_tool_result_block(span, tag, config);
                debug!(
                    tag,
                    original_chars = span.chars().count(),
                    compacted_chars = replacement.chars().count(),
                    "compacted embedded tool-result block"
                );
                out.push_str(&replacement);
            } else {
                out.push_str(span);
            }
            last = found.end();
        }
        out.push_str(&current[last..]);
        current = out;
    }

    current
}

fn replace_read_note_results(content: &str, config: &CompactionConfig) -> String {
    let mut out = String::with_capacity(content.len());
    let mut pos = 0;

    while let Some(found) = content[pos..].find(READ_NOTE_MARKER) {
        let json_start = pos + found + READ_NOTE_MARKER.len();
        out.push_str(&content[pos..json_start]);
        // Whatever happens below, scanning resumes after the marker.
        pos = json_start;

        let Some(balanced) = extract_balanced_json(content, json_start) else {
            continue;
        };
        let Ok(parsed) = serde_json::from_str::<Value>(balanced.json) else {
            continue;
        };

        let oversized = parsed
            .get("content")
            .and_then(Value::as_str)
            .is_some_and(|text| text.chars().count() > config.verbatim_threshold);
        if !oversized {
            continue;
        }

        let compacted = compact_read_note_result(&parsed, config);
        if let Ok(serialized) = serde_json::to_string(&compacted) {
            debug!(
                original_chars = balanced.json.chars().count(),
                compacted_chars = serialized.chars().count(),
                "compacted embedded readNote result"
            );
            out.push_str(&serialized);
            pos = balanced.end;
        }
    }

    out.push_str(&content[pos..]);
    out
}

/// Compact one tool-result XML block into a `<prior_context>` envelope.
///
/// Non-recoverable tags are returned unchanged. `localSearch` blocks get a
/// per-document rendering; all other tags compact their `<content>` child
/// (or the whole block when absent) by section.
pub fn compact_tool_result_block(block: &str, tag: &str, config: &CompactionConfig) -> String {
    if !registry::is_recoverable(tag) {
        return block.to_string();
    }

    if tag == "localSearch" {
        if let Some(rendered) = compact_local_search_block(block, config) {
            return rendered;
        }
        // Zero parseable documents: fall through to the generic path.
    }

    let extractor = registry::lookup(tag)
        .map(|block_type| block_type.extractor)
        .unwrap_or(registry::SourceExtractor::None);
    let source = extract_source(block, extractor).unwrap_or_else(|| tag.to_string());
    let content = extract_child(block, "content").unwrap_or(block);
    let compacted = compact_by_section(
        content,
        config.preview_chars_per_section,
        config.max_sections,
    );

    prior_context_envelope(&source, registry::source_type_of(tag), &compacted)
}

struct SearchDocument {
    path: String,
    title: String,
    content: String,
}

fn parse_documents(block: &str) -> Vec<SearchDocument> {
    let mut documents = Vec::new();
    let mut pos = 0;

    while let Some(found) = block[pos..].find("<document>") {
        let inner_start = pos + found + "<document>".len();
        let Some(inner_len) = block[inner_start..].find("</document>") else {
            break;
        };
        let inner = &block[inner_start..inner_start + inner_len];
        pos = inner_start + inner_len + "</document>".len();

        let path = extract_child(inner, "path").unwrap_or("").to_string();
        let title = extract_child(inner, "title")
            .map(str::to_string)
            .unwrap_or_else(|| {
                path.rsplit('/')
                    .next()
                    .unwrap_or(path.as_str())
                    .to_string()
            });
        let content = extract_child(inner, "content").unwrap_or("").to_string();

        documents.push(SearchDocument {
            path,
            title,
            content,
        });
    }

    documents
}

/// Per-document rendering for localSearch results. Titles and paths are
/// never truncated; document count and order are preserved exactly.
fn compact_local_search_block(block: &str, config: &CompactionConfig) -> Option<String> {
    let documents = parse_documents(block);
    if documents.is_empty() {
        return None;
    }

    let entries: Vec<String> = documents
        .iter()
        .enumerate()
        .map(|(index, doc)| {
            format!(
                "{}. [[{}]] ({})\n   {}",
                index + 1,
                doc.title,
                doc.path,
                trim_preview(&doc.content, config.preview_chars_per_section),
            )
        })
        .collect();

    let body = format!(
        "[{} search results - use localSearch to re-query]\n\n{}",
        documents.len(),
        entries.join("\n\n"),
    );

    Some(prior_context_envelope("localSearch", SourceType::Note, &body))
}

/// Plain trim-and-ellipsis preview, no boundary heuristics.
fn trim_preview(content: &str, max_chars: usize) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut = trimmed
        .char_indices()
        .nth(max_chars)
        .map_or(trimmed.len(), |(idx, _)| idx);
    format!("{}...", trimmed[..cut].trim_end())
}

/// Compact a parsed readNote result object.
///
/// The `content` field is replaced with a section-compacted preview behind
/// [`READ_NOTE_COMPACTED_PREFIX`] and `wasCompacted: true` is appended;
/// every other field is preserved in its original position. Objects without
/// a string `content` field are returned unchanged.
pub fn compact_read_note_result(result: &Value, config: &CompactionConfig) -> Value {
    let Value::Object(fields) = result else {
        return result.clone();
    };
    let Some(Value::String(content)) = fields.get("content") else {
        return result.clone();
    };

    let compacted = compact_by_section(
        content,
        config.preview_chars_per_section,
        config.max_sections,
    );

    let mut new_fields = fields.clone();
    new_fields.insert(
        "content".into(),
        Value::String(format!("{READ_NOTE_COMPACTED_PREFIX}{compacted}")),
    );
    new_fields.insert("wasCompacted".into(), Value::Bool(true));
    Value::Object(new_fields)
}
