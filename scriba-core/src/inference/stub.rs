//! Deterministic placeholder backend without real inference.
//!
//! Lets the full pipeline (segmentation, padding, time mapping) be exercised
//! end-to-end before a real model is wired in, and serves as the default
//! backend for the demo binary when the `whisper` feature is off.

use tracing::debug;

use crate::error::Result;
use crate::inference::{DecodeOptions, RawSegment, RawToken, SpeechEngine};

/// Sentinel id reported by the stub; chosen to match whisper's token layout
/// closely enough for suppression tests.
const STUB_EOT_ID: i32 = 50_256;

/// Echo-style stub engine.
///
/// For every window it emits one segment spanning the non-padding portion,
/// labelled with the window length, plus two tokens (one speech, one
/// end-of-transcript sentinel) so that suppression paths are reachable.
pub struct StubEngine {
    window_count: u32,
}

impl StubEngine {
    pub fn new() -> Self {
        Self { window_count: 0 }
    }
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for StubEngine {
    fn warm_up(&mut self) -> Result<()> {
        debug!("StubEngine::warm_up (no-op)");
        Ok(())
    }

    fn transcribe(&mut self, samples: &[f32], options: &DecodeOptions) -> Result<Vec<RawSegment>> {
        self.window_count += 1;

        // Pretend the phrase covers the leading non-silent part; centisecond
        // granularity at 16 kHz is 160 samples per unit.
        let voiced = samples
            .iter()
            .rposition(|&s| s != 0.0)
            .map(|i| i + 1)
            .unwrap_or(0);
        let end_cs = (voiced / 160) as i64;

        let text = format!("[stub {}: {} samples]", self.window_count, samples.len());
        let tokens = if options.token_timestamps {
            vec![
                RawToken {
                    start_cs: 0,
                    end_cs,
                    text: text.clone(),
                    probability: 0.75,
                    id: 1_000,
                },
                RawToken {
                    start_cs: end_cs,
                    end_cs,
                    text: "[_EOT_]".to_string(),
                    probability: 1.0,
                    id: STUB_EOT_ID,
                },
            ]
        } else {
            Vec::new()
        };

        Ok(vec![RawSegment {
            start_cs: 0,
            end_cs,
            text,
            tokens,
        }])
    }

    fn end_of_text_id(&self) -> i32 {
        STUB_EOT_ID
    }

    fn reset(&mut self) {
        debug!("StubEngine::reset");
    }
}
