//! Prompt-layer data model.
//!
//! An outbound request is assembled from five logical layers. A prompt
//! assembler (external to this engine) builds a [`PromptContextEnvelope`] per
//! request; the layer-to-message assembler flattens it into the
//! [`ProviderMessage`] list actually sent to a model.
//!
//! Envelopes are created fresh per turn and are immutable inputs — the engine
//! never retains references across calls.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One of the five fixed logical prompt layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerId {
    /// System instructions — the cacheable prefix.
    #[serde(rename = "L1_SYSTEM")]
    L1System,
    /// Cumulative context library from previous turns.
    #[serde(rename = "L2_PREVIOUS")]
    L2Previous,
    /// Context attached to the current turn.
    #[serde(rename = "L3_TURN")]
    L3Turn,
    /// Reserved for conversation-history formatting; never emitted yet.
    #[serde(rename = "L4_STRIP")]
    L4Strip,
    /// The literal user query.
    #[serde(rename = "L5_USER")]
    L5User,
}

impl LayerId {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerId::L1System => "L1_SYSTEM",
            LayerId::L2Previous => "L2_PREVIOUS",
            LayerId::L3Turn => "L3_TURN",
            LayerId::L4Strip => "L4_STRIP",
            LayerId::L5User => "L5_USER",
        }
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of context with a stable identifier, used for cross-turn
/// deduplication. The id is a content fingerprint or logical key such as
/// `note:research/paper.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub content: String,
}

impl Segment {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// One logical prompt layer: its rendered text plus the segments it was
/// rendered from (segments carry the ids used for deduplication).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptLayerSegment {
    pub layer_id: LayerId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<Segment>,
}

impl PromptLayerSegment {
    /// Create a layer with rendered text and no tracked segments.
    pub fn new(layer_id: LayerId, text: impl Into<String>) -> Self {
        Self {
            layer_id,
            text: text.into(),
            segments: Vec::new(),
        }
    }

    /// Attach tracked segments.
    #[must_use]
    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }

    /// Whether the layer carries any non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// All layers for one outbound request, plus per-layer content hashes used
/// by the caller for cache-invalidation decisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptContextEnvelope {
    pub layers: Vec<PromptLayerSegment>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub layer_hashes: HashMap<LayerId, String>,
}

impl PromptContextEnvelope {
    pub fn new(layers: Vec<PromptLayerSegment>) -> Self {
        Self {
            layers,
            layer_hashes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_layer_hashes(mut self, hashes: HashMap<LayerId, String>) -> Self {
        self.layer_hashes = hashes;
        self
    }

    /// The layer with the given id, if present.
    pub fn layer(&self, id: LayerId) -> Option<&PromptLayerSegment> {
        self.layers.iter().find(|layer| layer.layer_id == id)
    }

    /// The set of segment ids tracked by a layer. Empty when the layer is
    /// absent or tracks no segments.
    pub fn segment_ids(&self, id: LayerId) -> HashSet<&str> {
        self.layer(id)
            .map(|layer| {
                layer
                    .segments
                    .iter()
                    .map(|segment| segment.id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Role of a provider-bound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

/// A flattened message ready for a provider request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ProviderMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}
