//! # Contextfold Core
//!
//! Domain types for the contextfold context layering and compaction engine.
//! This crate defines the block-type registry, the compaction configuration,
//! and the prompt-layer data model that the algorithm crates operate on.
//!
//! Everything here is an immutable value type. The registry is built once at
//! process start and is read-only afterwards, so it may be consulted from any
//! number of threads without synchronization.

pub mod config;
pub mod error;
pub mod layer;
pub mod registry;

// Re-export key types at crate root for ergonomics
pub use config::CompactionConfig;
pub use error::{Error, Result};
pub use layer::{
    LayerId, MessageRole, PromptContextEnvelope, PromptLayerSegment, ProviderMessage, Segment,
};
pub use registry::{ContextBlockType, SourceExtractor, SourceType};
