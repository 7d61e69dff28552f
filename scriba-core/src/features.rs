//! Caller-visible output types.
//!
//! A `Feature` is one timed, labelled annotation on the original stream:
//! either a whole recognised phrase or a single sub-word token, depending on
//! the pipeline's split mode. Timestamps are absolute stream time in seconds
//! (the engine's window-relative offsets have already been remapped).

use serde::{Deserialize, Serialize};

/// One recognised phrase or token, anchored to absolute stream time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// Onset in seconds from the start of the stream.
    pub onset_secs: f64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Recognised text (a phrase in segment mode, a token otherwise).
    pub label: String,
    /// Confidence in [0.0, 1.0]. Fixed at 1.0 for segment-level features,
    /// the engine-reported token probability for token-level ones.
    pub confidence: f32,
}

/// Granularity at which recognised text is split into features.
///
/// `Words` keeps the segment-shaped event per unit but asks the engine to
/// cut its segments at word boundaries (token timestamps + one-word maximum
/// segment length), so the split happens at the engine-parameter level, not
/// in the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// One feature per recognised phrase.
    Sentences,
    /// One feature per word (engine-side segmentation).
    Words,
    /// One feature per sub-word token, with per-token confidence.
    Tokens,
}

impl SplitMode {
    /// Parameter-surface encoding: 0 = sentences, 1 = words, 2 = tokens.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => SplitMode::Sentences,
            1 => SplitMode::Words,
            _ => SplitMode::Tokens,
        }
    }

    pub fn index(self) -> usize {
        match self {
            SplitMode::Sentences => 0,
            SplitMode::Words => 1,
            SplitMode::Tokens => 2,
        }
    }

    /// Whether features are emitted per token rather than per segment.
    pub fn is_token_level(self) -> bool {
        self == SplitMode::Tokens
    }
}
