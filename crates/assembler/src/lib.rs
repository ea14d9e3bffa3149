//! # Contextfold Assembler
//!
//! Flattens the five logical prompt layers of a [`PromptContextEnvelope`]
//! into the message list sent to a provider, deduplicating current-turn
//! context against the cumulative context library to maximize provider-side
//! prompt caching.
//!
//! [`PromptContextEnvelope`]: contextfold_core::PromptContextEnvelope

pub mod convert;

pub use convert::{
    ConvertOptions, convert, extract_full_context, extract_system_message, extract_user_content,
    layer_hashes,
};
