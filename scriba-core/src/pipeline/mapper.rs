//! Remapping of window-relative engine events onto absolute stream time.
//!
//! The engine times everything in centiseconds from the start of the window
//! it was handed. Each window corresponds to a known position on the source
//! stream, so turning its events into `Feature`s is a pure shift: add the
//! segment's start time in seconds, divide centiseconds by 100.

use crate::features::{Feature, SplitMode};
use crate::inference::RawSegment;

const CENTISECONDS_PER_SECOND: f64 = 100.0;

/// Map one recognition result to features.
///
/// `source_time_offset` is the absolute stream time, in seconds, at which
/// the recognised window began. In `Sentences` and `Words` mode one feature
/// is emitted per engine segment with confidence fixed at 1.0; in `Tokens`
/// mode one per token, carrying the decoder probability. With
/// `suppress_non_speech` set, tokens at or above `end_of_text_id` (control
/// tokens) are dropped.
pub fn map_events(
    segments: &[RawSegment],
    source_time_offset: f64,
    mode: SplitMode,
    suppress_non_speech: bool,
    end_of_text_id: i32,
) -> Vec<Feature> {
    let mut features = Vec::new();
    for segment in segments {
        if mode.is_token_level() {
            for token in &segment.tokens {
                if suppress_non_speech && token.id >= end_of_text_id {
                    continue;
                }
                features.push(Feature {
                    onset_secs: centiseconds(token.start_cs) + source_time_offset,
                    duration_secs: centiseconds(token.end_cs - token.start_cs),
                    label: token.text.clone(),
                    confidence: token.probability,
                });
            }
        } else {
            features.push(Feature {
                onset_secs: centiseconds(segment.start_cs) + source_time_offset,
                duration_secs: centiseconds(segment.end_cs - segment.start_cs),
                label: segment.text.clone(),
                confidence: 1.0,
            });
        }
    }
    features
}

fn centiseconds(cs: i64) -> f64 {
    cs as f64 / CENTISECONDS_PER_SECOND
}
