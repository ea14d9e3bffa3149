//! Layer-to-message conversion.
//!
//! The five logical layers fold into at most two provider messages:
//!
//! - **system** — L1 system instructions, with the L2 context library
//!   appended as a labeled section. The library changes slowly across turns,
//!   so folding it into the system prefix keeps it inside the
//!   provider-cacheable region instead of repeating it per user message.
//! - **user** — L3 current-turn context deduplicated against L2 by segment
//!   id (duplicates collapse to a one-line reference pointing back at the
//!   library), followed by the literal L5 user query.
//!
//! L4 is reserved for conversation-history formatting and is never emitted.
//!
//! Conversion is a pure function of the envelope and options; no state is
//! carried between calls.

use contextfold_core::layer::{LayerId, PromptContextEnvelope, ProviderMessage};
use std::collections::HashMap;
use tracing::debug;

/// Header introducing the folded context library in the system message.
const CONTEXT_LIBRARY_HEADER: &str =
    "# Context Library\nPreviously shared context, kept for reference across turns:";

/// Header introducing deduplicated segment references in the user message.
const ATTACHED_CONTEXT_HEADER: &str =
    "Context attached to this message (already available in the Context Library):";

/// Separator between turn context and the literal user query.
const USER_QUERY_SEPARATOR: &str = "---";

/// Options controlling layer-to-message conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Emit the system message (L1 + folded L2).
    pub include_system_message: bool,
    /// Merge L3 turn context into the user message. When false the user
    /// message carries only the literal L5 text.
    pub merge_user_content: bool,
    /// Log per-layer statistics while converting.
    pub debug: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            include_system_message: true,
            merge_user_content: true,
            debug: false,
        }
    }
}

impl ConvertOptions {
    #[must_use]
    pub fn with_system_message(mut self, include: bool) -> Self {
        self.include_system_message = include;
        self
    }

    #[must_use]
    pub fn with_merge_user_content(mut self, merge: bool) -> Self {
        self.merge_user_content = merge;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Convert an envelope into the ordered `[system?, user?]` message list.
/// Either message is absent when its source layers are empty.
pub fn convert(envelope: &PromptContextEnvelope, options: &ConvertOptions) -> Vec<ProviderMessage> {
    if options.debug {
        debug!(
            layers = envelope.layers.len(),
            hashes = envelope.layer_hashes.len(),
            "converting prompt envelope"
        );
    }

    let mut messages = Vec::with_capacity(2);
    if let Some(system) = build_system_message(envelope, options) {
        messages.push(ProviderMessage::system(system));
    }
    if let Some(user) = build_user_message(envelope, options) {
        messages.push(ProviderMessage::user(user));
    }
    messages
}

fn build_system_message(
    envelope: &PromptContextEnvelope,
    options: &ConvertOptions,
) -> Option<String> {
    if !options.include_system_message {
        return None;
    }
    let l1 = envelope.layer(LayerId::L1System).filter(|l| l.has_text())?;

    let mut system = l1.text.clone();
    if let Some(l2) = envelope.layer(LayerId::L2Previous) {
        if l2.has_text() {
            system.push_str("\n\n");
            system.push_str(CONTEXT_LIBRARY_HEADER);
            system.push_str("\n\n");
            system.push_str(&l2.text);
        }
    }
    Some(system)
}

fn build_user_message(
    envelope: &PromptContextEnvelope,
    options: &ConvertOptions,
) -> Option<String> {
    let user_text = envelope
        .layer(LayerId::L5User)
        .filter(|l| l.has_text())
        .map(|l| l.text.as_str());

    if !options.merge_user_content {
        return user_text.map(str::to_string);
    }

    let library_ids = envelope.segment_ids(LayerId::L2Previous);
    let mut references: Vec<&str> = Vec::new();
    let mut parts: Vec<String> = Vec::new();

    if let Some(l3) = envelope.layer(LayerId::L3Turn) {
        for segment in &l3.segments {
            if library_ids.contains(segment.id.as_str()) {
                if options.debug {
                    debug!(id = %segment.id, "segment deduplicated against context library");
                }
                references.push(&segment.id);
            } else if !segment.content.is_empty() {
                parts.push(segment.content.clone());
            }
        }
    }

    if !references.is_empty() {
        let mut block = String::from(ATTACHED_CONTEXT_HEADER);
        for id in &references {
            block.push_str("\n- ");
            block.push_str(id);
        }
        parts.insert(0, block);
    }

    match (parts.is_empty(), user_text) {
        (true, None) => None,
        (true, Some(user)) => Some(user.to_string()),
        (false, None) => Some(parts.join("\n\n")),
        (false, Some(user)) => Some(format!(
            "{}\n\n{USER_QUERY_SEPARATOR}\n\n{user}",
            parts.join("\n\n")
        )),
    }
}

// ── Helper projections ─────────────────────────────────────────────────────

/// The L1 system text alone, without the folded library.
pub fn extract_system_message(envelope: &PromptContextEnvelope) -> Option<String> {
    envelope
        .layer(LayerId::L1System)
        .filter(|l| l.has_text())
        .map(|l| l.text.clone())
}

/// The merged L3 + L5 user content, without any L2 deduplication.
pub fn extract_user_content(envelope: &PromptContextEnvelope) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(l3) = envelope.layer(LayerId::L3Turn) {
        for segment in &l3.segments {
            if !segment.content.is_empty() {
                parts.push(&segment.content);
            }
        }
    }
    if let Some(l5) = envelope.layer(LayerId::L5User) {
        if l5.has_text() {
            parts.push(&l5.text);
        }
    }
    parts.join("\n\n")
}

/// Every byte of context: L2, L3, and L5. For callers that need the full
/// content regardless of deduplication, e.g. multimodal asset extraction.
pub fn extract_full_context(envelope: &PromptContextEnvelope) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(l2) = envelope.layer(LayerId::L2Previous) {
        if l2.has_text() {
            parts.push(&l2.text);
        }
    }
    if let Some(l3) = envelope.layer(LayerId::L3Turn) {
        if l3.segments.is_empty() {
            if l3.has_text() {
                parts.push(&l3.text);
            }
        } else {
            for segment in &l3.segments {
                if !segment.content.is_empty() {
                    parts.push(&segment.content);
                }
            }
        }
    }
    if let Some(l5) = envelope.layer(LayerId::L5User) {
        if l5.has_text() {
            parts.push(&l5.text);
        }
    }
    parts.join("\n\n")
}

/// The envelope's per-layer hashes, verbatim. Cache-invalidation decisions
/// belong to the caller.
pub fn layer_hashes(envelope: &PromptContextEnvelope) -> &HashMap<LayerId, String> {
    &envelope.layer_hashes
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextfold_core::layer::{MessageRole, PromptLayerSegment, Segment};

    fn envelope_with(layers: Vec<PromptLayerSegment>) -> PromptContextEnvelope {
        PromptContextEnvelope::new(layers)
    }

    #[test]
    fn empty_envelope_produces_no_messages() {
        let envelope = envelope_with(vec![]);
        assert!(convert(&envelope, &ConvertOptions::default()).is_empty());
    }

    #[test]
    fn system_message_from_l1_alone() {
        let envelope = envelope_with(vec![PromptLayerSegment::new(
            LayerId::L1System,
            "You are a helpful assistant.",
        )]);

        let messages = convert(&envelope, &ConvertOptions::default());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, "You are a helpful assistant.");
    }

    #[test]
    fn library_folds_into_system_message() {
        let envelope = envelope_with(vec![
            PromptLayerSegment::new(LayerId::L1System, "System rules."),
            PromptLayerSegment::new(LayerId::L2Previous, "<prior_context>old note</prior_context>"),
        ]);

        let messages = convert(&envelope, &ConvertOptions::default());
        assert_eq!(messages.len(), 1);
        let system = &messages[0].content;
        assert!(system.starts_with("System rules."));
        assert!(system.contains("# Context Library"));
        assert!(system.contains("<prior_context>old note</prior_context>"));
    }

    #[test]
    fn include_system_message_false_skips_l1_and_l2() {
        let envelope = envelope_with(vec![
            PromptLayerSegment::new(LayerId::L1System, "System rules."),
            PromptLayerSegment::new(LayerId::L5User, "hi"),
        ]);

        let options = ConvertOptions::default().with_system_message(false);
        let messages = convert(&envelope, &options);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);
    }

    #[test]
    fn duplicate_segment_collapses_to_reference_line() {
        let note_content = "Full contents of note a, long enough to matter.";
        let envelope = envelope_with(vec![
            PromptLayerSegment::new(LayerId::L2Previous, "library text")
                .with_segments(vec![Segment::new("note:a.md", note_content)]),
            PromptLayerSegment::new(LayerId::L3Turn, "")
                .with_segments(vec![Segment::new("note:a.md", note_content)]),
            PromptLayerSegment::new(LayerId::L5User, "what does the note say?"),
        ]);

        let messages = convert(&envelope, &ConvertOptions::default());
        let user = &messages.last().unwrap().content;
        assert!(user.contains("- note:a.md"));
        assert!(!user.contains(note_content));
        assert!(user.ends_with("what does the note say?"));
        assert!(user.contains("---"));
    }

    #[test]
    fn fresh_segment_is_emitted_in_full() {
        let envelope = envelope_with(vec![
            PromptLayerSegment::new(LayerId::L2Previous, "library")
                .with_segments(vec![Segment::new("note:a.md", "a contents")]),
            PromptLayerSegment::new(LayerId::L3Turn, "").with_segments(vec![
                Segment::new("note:a.md", "a contents"),
                Segment::new("note:b.md", "b contents, new this turn"),
            ]),
        ]);

        let messages = convert(&envelope, &ConvertOptions::default());
        let user = &messages.last().unwrap().content;
        assert!(user.contains("- note:a.md"));
        assert!(user.contains("b contents, new this turn"));
        assert!(!user.contains("a contents"));
    }

    #[test]
    fn l5_stands_alone_without_turn_context() {
        let envelope = envelope_with(vec![PromptLayerSegment::new(
            LayerId::L5User,
            "just a question",
        )]);

        let messages = convert(&envelope, &ConvertOptions::default());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "just a question");
        assert!(!messages[0].content.contains("---"));
    }

    #[test]
    fn l4_strip_is_never_emitted() {
        let envelope = envelope_with(vec![
            PromptLayerSegment::new(LayerId::L1System, "sys"),
            PromptLayerSegment::new(LayerId::L4Strip, "deferred history strip"),
            PromptLayerSegment::new(LayerId::L5User, "query"),
        ]);

        let messages = convert(&envelope, &ConvertOptions::default());
        for message in &messages {
            assert!(!message.content.contains("deferred history strip"));
        }
    }

    #[test]
    fn merge_user_content_false_keeps_only_l5() {
        let envelope = envelope_with(vec![
            PromptLayerSegment::new(LayerId::L3Turn, "")
                .with_segments(vec![Segment::new("note:c.md", "c contents")]),
            PromptLayerSegment::new(LayerId::L5User, "only the query"),
        ]);

        let options = ConvertOptions::default().with_merge_user_content(false);
        let messages = convert(&envelope, &options);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "only the query");
    }

    #[test]
    fn message_order_is_system_then_user() {
        let envelope = envelope_with(vec![
            PromptLayerSegment::new(LayerId::L5User, "q"),
            PromptLayerSegment::new(LayerId::L1System, "s"),
        ]);

        let messages = convert(&envelope, &ConvertOptions::default());
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
    }

    // ── Helper projections ─────────────────────────────────────────────

    #[test]
    fn extract_user_content_skips_dedup() {
        let envelope = envelope_with(vec![
            PromptLayerSegment::new(LayerId::L2Previous, "library")
                .with_segments(vec![Segment::new("note:a.md", "a contents")]),
            PromptLayerSegment::new(LayerId::L3Turn, "")
                .with_segments(vec![Segment::new("note:a.md", "a contents")]),
            PromptLayerSegment::new(LayerId::L5User, "the question"),
        ]);

        let content = extract_user_content(&envelope);
        assert!(content.contains("a contents"));
        assert!(content.ends_with("the question"));
    }

    #[test]
    fn extract_full_context_includes_every_layer() {
        let envelope = envelope_with(vec![
            PromptLayerSegment::new(LayerId::L1System, "system text"),
            PromptLayerSegment::new(LayerId::L2Previous, "library text"),
            PromptLayerSegment::new(LayerId::L3Turn, "")
                .with_segments(vec![Segment::new("note:a.md", "turn context")]),
            PromptLayerSegment::new(LayerId::L5User, "user query"),
        ]);

        let full = extract_full_context(&envelope);
        assert!(full.contains("library text"));
        assert!(full.contains("turn context"));
        assert!(full.contains("user query"));
        assert!(!full.contains("system text"));
    }

    #[test]
    fn extract_system_message_is_l1_only() {
        let envelope = envelope_with(vec![
            PromptLayerSegment::new(LayerId::L1System, "system text"),
            PromptLayerSegment::new(LayerId::L2Previous, "library text"),
        ]);

        let system = extract_system_message(&envelope).unwrap();
        assert_eq!(system, "system text");
    }

    #[test]
    fn layer_hashes_are_returned_verbatim() {
        let mut hashes = HashMap::new();
        hashes.insert(LayerId::L2Previous, "hash-l2".to_string());
        let envelope = envelope_with(vec![]).with_layer_hashes(hashes.clone());

        assert_eq!(layer_hashes(&envelope), &hashes);
    }
}
