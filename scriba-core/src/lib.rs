//! # scriba-core
//!
//! Streaming speech-to-text segmentation library.
//!
//! ## Architecture
//!
//! ```text
//! Host blocks (any rate) → SegmentAccumulator ─┬─ FractionalResampler
//!                                              └─ BoundarySchedule
//!                                                    │ segment closed
//!                                          pad to ≥ 1.1 s window
//!                                                    │
//!                                         SpeechEngine::transcribe
//!                                                    │
//!                                     mapper → Vec<Feature> (stream time)
//! ```
//!
//! The pipeline is synchronous and single-threaded; recognition runs inline
//! on the caller's thread and may block for as long as the engine needs.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod buffering;
pub mod error;
pub mod features;
pub mod inference;
pub mod models;
pub mod pipeline;

// Convenience re-exports for downstream crates
pub use audio::FractionalResampler;
pub use error::ScribaError;
pub use features::{Feature, SplitMode};
pub use inference::{stub::StubEngine, DecodeOptions, RawSegment, RawToken, SpeechEngine};
pub use pipeline::{ParameterDescriptor, PipelineConfig, TranscriptionPipeline};

#[cfg(feature = "whisper")]
pub use inference::{WhisperConfig, WhisperEngine};
