//! # Contextfold Compaction
//!
//! Deterministic, string-driven compaction for LLM chat context. Keeps the
//! prompt size bounded while preserving enough structure for the model to
//! recover full detail on demand — via a tool call or link, never via a
//! summarization model call.
//!
//! Two pipelines use these algorithms:
//!
//! 1. After a model responds, [`output::compact_assistant_output`] shrinks
//!    oversized tool-result blocks embedded in the response before it is
//!    written to durable chat history.
//! 2. Before the next request, [`library::compact_turn_context`] folds the
//!    previous turn's context into the cumulative context library.
//!
//! Every function is a synchronous, pure transform over immutable inputs.
//! No failure mode errors out: malformed input degrades to returning the
//! original data unchanged.

pub mod json;
pub mod library;
pub mod output;
pub mod text;
pub mod xml;

pub use json::{BalancedJson, extract_balanced_json};
pub use library::{compact_turn_context, compact_xml_block, refetch_instruction};
pub use output::{
    READ_NOTE_COMPACTED_PREFIX, READ_NOTE_MARKER, compact_assistant_output, compact_output_string,
    compact_read_note_result, compact_tool_result_block,
};
pub use text::{compact_by_section, truncate_with_ellipsis};
