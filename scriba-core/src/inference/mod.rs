//! Speech engine abstraction.
//!
//! The `SpeechEngine` trait decouples the pipeline from any specific
//! recognition backend (stub, whisper.cpp, a remote service, …). The engine
//! is a black-box batch transcriber: it consumes one fixed-rate float window
//! and returns phrase segments with window-relative timestamps in
//! centiseconds, optionally carrying per-token timing and probabilities.
//!
//! `&mut self` on `transcribe` intentionally expresses that decoders are
//! stateful (KV caches, language detection carry-over). The pipeline
//! owns its engine exclusively, so no synchronisation wrapper is needed.

pub mod stub;

#[cfg(feature = "whisper")]
pub mod whisper;

#[cfg(feature = "whisper")]
pub use whisper::{WhisperConfig, WhisperEngine};

use crate::error::Result;
use crate::features::SplitMode;

/// Decoding configuration handed to the engine per recognition call.
///
/// Mirrors the knobs of a whisper-style decoder; backends ignore flags they
/// have no counterpart for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Greedy (non-beam) decoding.
    pub greedy: bool,
    /// Do not condition on text from previous windows.
    pub no_context: bool,
    /// Suppress non-speech token ids during decoding.
    pub suppress_non_speech: bool,
    /// Compute per-token timestamps.
    pub token_timestamps: bool,
    /// Cap segment length (one word) so segments align with words.
    pub max_segment_length: bool,
    /// Cut segments on word boundaries rather than token boundaries.
    pub split_on_word: bool,
}

impl DecodeOptions {
    /// Options for a split mode. Word mode is realised entirely here: the
    /// engine cuts its segments at word boundaries; the mapper never splits.
    pub fn for_mode(mode: SplitMode, suppress_non_speech: bool) -> Self {
        Self {
            greedy: true,
            no_context: true,
            suppress_non_speech,
            token_timestamps: mode != SplitMode::Sentences,
            max_segment_length: mode == SplitMode::Words,
            split_on_word: mode == SplitMode::Words,
        }
    }
}

/// One recognised phrase, timed relative to the analysis window.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSegment {
    /// Start offset in centiseconds from the window start.
    pub start_cs: i64,
    /// End offset in centiseconds from the window start.
    pub end_cs: i64,
    pub text: String,
    /// Sub-word tokens; empty when token timestamps were not requested.
    pub tokens: Vec<RawToken>,
}

/// One sub-word token inside a `RawSegment`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub start_cs: i64,
    pub end_cs: i64,
    pub text: String,
    /// Decoder probability in [0.0, 1.0].
    pub probability: f32,
    /// Vocabulary id. Ids at or above the engine's end-of-transcript
    /// sentinel are control tokens, not speech.
    pub id: i32,
}

/// Contract for speech recognition backends.
pub trait SpeechEngine: Send + 'static {
    /// One-time warm-up: load weights, run a dummy decode. Called once
    /// before streaming starts.
    ///
    /// # Errors
    /// Returns an error if model files are missing or corrupt.
    fn warm_up(&mut self) -> Result<()>;

    /// Transcribe one mono f32 window at the pipeline's target rate.
    ///
    /// The window is always at least the engine's minimum length; the
    /// invoker pads before calling. May return zero segments.
    fn transcribe(&mut self, samples: &[f32], options: &DecodeOptions) -> Result<Vec<RawSegment>>;

    /// Vocabulary id of the end-of-transcript sentinel. Token ids at or
    /// above this value are treated as non-speech by the mapper.
    fn end_of_text_id(&self) -> i32;

    /// Reset decoder state (between streams).
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_mode_requests_no_token_timestamps() {
        let opts = DecodeOptions::for_mode(SplitMode::Sentences, true);
        assert!(!opts.token_timestamps);
        assert!(!opts.split_on_word);
        assert!(opts.no_context);
        assert!(opts.suppress_non_speech);
    }

    #[test]
    fn word_mode_splits_at_the_engine() {
        let opts = DecodeOptions::for_mode(SplitMode::Words, false);
        assert!(opts.token_timestamps);
        assert!(opts.max_segment_length);
        assert!(opts.split_on_word);
        assert!(!opts.suppress_non_speech);
    }

    #[test]
    fn token_mode_requests_timestamps_without_word_splitting() {
        let opts = DecodeOptions::for_mode(SplitMode::Tokens, true);
        assert!(opts.token_timestamps);
        assert!(!opts.max_segment_length);
        assert!(!opts.split_on_word);
    }
}
