//! Host-facing transcription pipeline.
//!
//! Ties the pieces together: host blocks go through the segmenting
//! accumulator, each closed segment is padded and handed to the speech
//! engine, and the engine's window-relative events are remapped to absolute
//! stream time. One `TranscriptionPipeline` value owns all mutable state
//! exclusively; everything here is synchronous and single-threaded.
//!
//! Lifecycle: `new` → `warm_up` → `prepare(source_rate)` → any number of
//! `process(block)` calls → `flush` at stream end. `reset` rewinds for a
//! new stream on the same engine.

pub mod mapper;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::buffering::{BoundarySchedule, SegmentAccumulator, Step};
use crate::error::{Result, ScribaError};
use crate::features::{Feature, SplitMode};
use crate::inference::{DecodeOptions, SpeechEngine};
use crate::models;

/// Pipeline configuration. `Default` matches the common deployment:
/// 16 kHz engine rate, token-level events, non-speech suppression on.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Sample rate the engine expects, in Hz.
    pub target_sample_rate: u32,
    /// Granularity of emitted features.
    pub split_mode: SplitMode,
    /// Drop control tokens from token-level output.
    pub suppress_non_speech: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16_000,
            split_mode: SplitMode::Tokens,
            suppress_non_speech: true,
        }
    }
}

/// Host-visible description of one tunable parameter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub identifier: String,
    pub name: String,
    pub min_value: f32,
    pub max_value: f32,
    pub default_value: f32,
    pub quantized: bool,
    /// Display names per quantized value; empty when free-form.
    pub value_names: Vec<String>,
}

/// Streaming audio → timed transcription features.
pub struct TranscriptionPipeline {
    accumulator: SegmentAccumulator,
    engine: Box<dyn SpeechEngine>,
    target_sample_rate: u32,
    split_mode: SplitMode,
    suppress_non_speech: bool,
    /// Index into the discovered model list; 0 selects the built-in default.
    model_index: usize,
    prepared: bool,
}

impl TranscriptionPipeline {
    pub fn new(config: PipelineConfig, engine: Box<dyn SpeechEngine>) -> Self {
        Self {
            accumulator: SegmentAccumulator::new(f64::from(config.target_sample_rate)),
            engine,
            target_sample_rate: config.target_sample_rate,
            split_mode: config.split_mode,
            suppress_non_speech: config.suppress_non_speech,
            model_index: 0,
            prepared: false,
        }
    }

    /// One-time engine warm-up. Call before `prepare`.
    ///
    /// # Errors
    /// Propagates engine initialisation failures (missing model files etc.).
    pub fn warm_up(&mut self) -> Result<()> {
        self.engine.warm_up()
    }

    /// Bind the pipeline to a source sample rate and rewind stream state.
    /// Installed boundaries survive; call `set_boundaries` to change them.
    ///
    /// # Errors
    /// `ScribaError::InvalidSampleRate` for non-finite or non-positive rates.
    pub fn prepare(&mut self, source_rate: f64) -> Result<()> {
        if !source_rate.is_finite() || source_rate <= 0.0 {
            return Err(ScribaError::InvalidSampleRate(source_rate));
        }
        self.accumulator.prepare(source_rate);
        self.prepared = true;
        info!(
            source_rate,
            target_rate = self.target_sample_rate,
            "pipeline prepared"
        );
        Ok(())
    }

    /// Replace the boundary set with source-sample positions.
    pub fn set_boundaries(&mut self, positions: impl IntoIterator<Item = u64>) {
        self.accumulator.set_boundaries(positions);
        debug!(
            boundaries = self.accumulator.schedule().len(),
            "boundary set replaced"
        );
    }

    /// Replace the boundary set with positions given in seconds of stream
    /// time. Non-finite and negative times are discarded.
    pub fn boundaries_from_seconds(&mut self, times: &[f64]) {
        let schedule =
            BoundarySchedule::from_seconds(times.iter().copied(), self.accumulator.source_rate());
        debug!(
            supplied = times.len(),
            kept = schedule.len(),
            "boundary set replaced"
        );
        self.accumulator.set_schedule(schedule);
    }

    pub fn split_mode(&self) -> SplitMode {
        self.split_mode
    }

    /// Source samples consumed since the last `prepare`/`reset`.
    pub fn advancement(&self) -> u64 {
        self.accumulator.advancement()
    }

    /// Feed one host block. Every boundary crossed inside the block fires
    /// exactly one recognition; the returned features cover all of them, in
    /// stream order. Blocks may be any length, including empty.
    ///
    /// # Errors
    /// `ScribaError::NotPrepared` when `prepare` has not been called. Engine
    /// failures are logged and yield no events, never an error.
    pub fn process(&mut self, block: &[f32]) -> Result<Vec<Feature>> {
        if !self.prepared {
            return Err(ScribaError::NotPrepared);
        }

        let mut features = Vec::new();
        let mut offset = 0usize;
        while offset < block.len() {
            match self.accumulator.plan(block.len() - offset) {
                Step::AdvanceWithinSegment(n) => {
                    self.accumulator.absorb(&block[offset..offset + n]);
                    offset += n;
                }
                Step::CloseSegment { span, started_at } => {
                    self.accumulator.absorb(&block[offset..offset + span]);
                    offset += span;
                    features.extend(self.recognize(started_at));
                }
            }
        }
        Ok(features)
    }

    /// Recognise whatever is buffered past the last boundary. Runs the
    /// engine even when nothing is buffered (over an all-padding window), so
    /// stream-end behaviour does not depend on where the last boundary fell.
    ///
    /// # Errors
    /// `ScribaError::NotPrepared` when `prepare` has not been called.
    pub fn flush(&mut self) -> Result<Vec<Feature>> {
        if !self.prepared {
            return Err(ScribaError::NotPrepared);
        }
        let started_at = self.accumulator.open_segment_start();
        Ok(self.recognize(started_at))
    }

    /// Rewind everything: stream position, buffers, boundaries and the
    /// engine's decoder state. The source rate binding survives.
    pub fn reset(&mut self) {
        self.accumulator.reset_stream();
        self.accumulator.clear_boundaries();
        self.engine.reset();
        debug!("pipeline reset");
    }

    /// Read a parameter by its string key. Unknown keys are logged and read
    /// as 0.0.
    pub fn parameter(&self, key: &str) -> f32 {
        match key {
            "model" => self.model_index as f32,
            "splitmode" => self.split_mode.index() as f32,
            "suppressnonspeechtokens" => {
                if self.suppress_non_speech {
                    1.0
                } else {
                    0.0
                }
            }
            other => {
                warn!(key = other, "read of unknown parameter");
                0.0
            }
        }
    }

    /// Set a parameter by its string key. Unknown keys are logged and
    /// ignored. Takes effect from the next recognition.
    pub fn set_parameter(&mut self, key: &str, value: f32) {
        match key {
            "model" => self.model_index = value.max(0.0).round() as usize,
            "splitmode" => {
                self.split_mode = SplitMode::from_index(value.max(0.0).round() as usize);
            }
            "suppressnonspeechtokens" => self.suppress_non_speech = value > 0.5,
            other => warn!(key = other, value, "write to unknown parameter"),
        }
    }

    /// Descriptors for the host's parameter UI. The model list reflects the
    /// files discoverable at call time.
    pub fn parameter_descriptors() -> Vec<ParameterDescriptor> {
        let mut model_names = vec!["default (built-in)".to_string()];
        model_names.extend(models::discover().into_iter().map(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        }));

        vec![
            ParameterDescriptor {
                identifier: "model".into(),
                name: "Model".into(),
                min_value: 0.0,
                max_value: (model_names.len() - 1) as f32,
                default_value: 0.0,
                quantized: true,
                value_names: model_names,
            },
            ParameterDescriptor {
                identifier: "splitmode".into(),
                name: "Split by".into(),
                min_value: 0.0,
                max_value: 2.0,
                default_value: 2.0,
                quantized: true,
                value_names: vec!["sentences".into(), "words".into(), "tokens".into()],
            },
            ParameterDescriptor {
                identifier: "suppressnonspeechtokens".into(),
                name: "Suppress non-speech tokens".into(),
                min_value: 0.0,
                max_value: 1.0,
                default_value: 1.0,
                quantized: true,
                value_names: vec!["off".into(), "on".into()],
            },
        ]
    }

    /// Minimum analysis window the engine is ever handed: 1.1 s at the
    /// target rate. Shorter segments are zero-padded up to this.
    fn min_window_len(&self) -> usize {
        (self.target_sample_rate + self.target_sample_rate / 10) as usize
    }

    fn recognize(&mut self, started_at: u64) -> Vec<Feature> {
        let window = self.accumulator.drain_segment(self.min_window_len());
        let options = DecodeOptions::for_mode(self.split_mode, self.suppress_non_speech);
        debug!(
            window_len = window.len(),
            started_at,
            mode = ?self.split_mode,
            "invoking recognition"
        );

        let segments = match self.engine.transcribe(&window, &options) {
            Ok(segments) => segments,
            Err(err) => {
                warn!(error = %err, started_at, "recognition failed, emitting no events");
                return Vec::new();
            }
        };

        let source_time_offset = started_at as f64 / self.accumulator.source_rate();
        mapper::map_events(
            &segments,
            source_time_offset,
            self.split_mode,
            self.suppress_non_speech,
            self.engine.end_of_text_id(),
        )
    }
}
