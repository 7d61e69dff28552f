//! Boundary-aware accumulation of the resampled stream.
//!
//! ## State machine
//!
//! For each host block the pipeline repeatedly asks `plan` what to do with
//! the samples still unconsumed in the block. There are exactly two
//! transitions:
//!
//! ```text
//! AdvanceWithinSegment(n)            no boundary inside the remaining
//!                                    samples; absorb all n and stop.
//! CloseSegment { span, started_at }  the next boundary falls within the
//!                                    block; absorb exactly `span` samples,
//!                                    then recognition fires and the buffer
//!                                    is drained.
//! ```
//!
//! A boundary landing exactly on the end of a block closes within that same
//! call (the lookup is strictly-greater, the distance check is `>`), never
//! on the next one.

use tracing::debug;

use crate::audio::resample::{max_output_len, warn_short_consumption};
use crate::audio::FractionalResampler;
use crate::buffering::boundary::BoundarySchedule;

/// What to do with the samples still unconsumed in the current host block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Absorb this many source samples; no segment closes.
    AdvanceWithinSegment(usize),
    /// Absorb exactly `span` source samples, then close the segment.
    /// `started_at` is the source-sample position at which the closing
    /// segment began accumulating (previous boundary, or 0).
    CloseSegment { span: usize, started_at: u64 },
}

/// Grows a target-rate sample buffer by driving the resampler block-wise,
/// tracking how many source samples have been consumed since the last reset
/// and where the externally supplied boundaries fall.
#[derive(Debug)]
pub struct SegmentAccumulator {
    resampler: FractionalResampler,
    /// Resampled samples awaiting recognition. May hold slack past `cursor`
    /// when a growth estimate overshot actual production.
    buffer: Vec<f32>,
    /// Write cursor into `buffer`; always ≤ `buffer.len()`.
    cursor: usize,
    /// Source samples consumed since the last stream reset.
    advancement: u64,
    schedule: BoundarySchedule,
}

impl SegmentAccumulator {
    pub fn new(target_rate: f64) -> Self {
        let mut resampler = FractionalResampler::new();
        resampler.set_target_sample_rate(target_rate);
        Self {
            resampler,
            buffer: Vec::new(),
            cursor: 0,
            advancement: 0,
            schedule: BoundarySchedule::new(),
        }
    }

    /// Set the source rate and reset all stream state (the boundary
    /// schedule is kept; it belongs to the run, not the stream position).
    pub fn prepare(&mut self, source_rate: f64) {
        self.resampler.prepare(source_rate);
        self.reset_stream();
    }

    /// Rewind to stream start: resampler phase/history, buffer, cursor and
    /// advancement. Boundaries are untouched.
    pub fn reset_stream(&mut self) {
        self.resampler.reset();
        self.buffer.clear();
        self.cursor = 0;
        self.advancement = 0;
    }

    /// Install a new boundary set, replacing the previous one wholesale.
    pub fn set_boundaries(&mut self, positions: impl IntoIterator<Item = u64>) {
        self.schedule.replace(positions);
    }

    /// Install a pre-built schedule, replacing the previous one wholesale.
    pub fn set_schedule(&mut self, schedule: BoundarySchedule) {
        self.schedule = schedule;
    }

    pub fn clear_boundaries(&mut self) {
        self.schedule.clear();
    }

    pub fn schedule(&self) -> &BoundarySchedule {
        &self.schedule
    }

    pub fn advancement(&self) -> u64 {
        self.advancement
    }

    /// Resampled samples currently buffered for the open segment.
    pub fn segment_len(&self) -> usize {
        self.cursor
    }

    pub fn source_rate(&self) -> f64 {
        self.resampler.source_rate()
    }

    pub fn target_rate(&self) -> f64 {
        self.resampler.target_rate()
    }

    /// Source-sample position at which the currently open segment began.
    pub fn open_segment_start(&self) -> u64 {
        self.schedule.segment_start(self.advancement)
    }

    /// Decide the next transition given `remaining` unconsumed samples in
    /// the current host block.
    pub fn plan(&self, remaining: usize) -> Step {
        match self.schedule.next_after(self.advancement) {
            Some(cut) => {
                let distance = cut - self.advancement;
                if distance > remaining as u64 {
                    // Boundary lies beyond this block; it will be reached in
                    // a later call.
                    Step::AdvanceWithinSegment(remaining)
                } else {
                    Step::CloseSegment {
                        span: distance as usize,
                        started_at: self.schedule.segment_start(self.advancement),
                    }
                }
            }
            None => Step::AdvanceWithinSegment(remaining),
        }
    }

    /// Resample `samples` into the accumulation buffer, growing it by
    /// exactly the missing capacity (zero-filled), and advance the counter
    /// by the sub-block length.
    pub fn absorb(&mut self, samples: &[f32]) {
        let needed = max_output_len(samples.len(), self.source_rate(), self.target_rate());
        let free = self.buffer.len() - self.cursor;
        if free < needed {
            self.buffer.resize(self.buffer.len() + (needed - free), 0.0);
        }

        let (consumed, produced) = self
            .resampler
            .process(samples, &mut self.buffer[self.cursor..]);
        warn_short_consumption(samples.len(), consumed);

        self.cursor += produced;
        self.advancement += samples.len() as u64;
        debug!(
            pushed = samples.len(),
            produced,
            buffered = self.cursor,
            advancement = self.advancement,
            "absorbed sub-block"
        );
    }

    /// Detach the accumulated segment, zero-padded up to `min_len` (real
    /// samples are never truncated), and clear the buffer and cursor.
    pub fn drain_segment(&mut self, min_len: usize) -> Vec<f32> {
        let mut samples = std::mem::take(&mut self.buffer);
        samples.truncate(self.cursor);
        if samples.len() < min_len {
            samples.resize(min_len, 0.0);
        }
        self.cursor = 0;
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulator_48k_to_16k() -> SegmentAccumulator {
        let mut acc = SegmentAccumulator::new(16_000.0);
        acc.prepare(48_000.0);
        acc
    }

    /// Mimic the pipeline's per-block loop, recording the length and start
    /// position of every closed segment.
    fn push_block(acc: &mut SegmentAccumulator, block: &[f32], closed: &mut Vec<(usize, u64)>) {
        let mut offset = 0usize;
        while offset < block.len() {
            match acc.plan(block.len() - offset) {
                Step::AdvanceWithinSegment(n) => {
                    acc.absorb(&block[offset..offset + n]);
                    offset += n;
                }
                Step::CloseSegment { span, started_at } => {
                    acc.absorb(&block[offset..offset + span]);
                    offset += span;
                    let segment = acc.drain_segment(0);
                    closed.push((segment.len(), started_at));
                }
            }
        }
    }

    #[test]
    fn block_without_boundaries_advances_in_one_step() {
        let acc = accumulator_48k_to_16k();
        assert_eq!(acc.plan(2000), Step::AdvanceWithinSegment(2000));
    }

    #[test]
    fn boundary_within_block_closes_segment() {
        let mut acc = accumulator_48k_to_16k();
        acc.set_boundaries([500, 1200]);
        assert_eq!(
            acc.plan(2000),
            Step::CloseSegment {
                span: 500,
                started_at: 0
            }
        );
    }

    #[test]
    fn boundary_exactly_at_block_end_closes_in_same_call() {
        let mut acc = accumulator_48k_to_16k();
        acc.set_boundaries([2000]);
        assert_eq!(
            acc.plan(2000),
            Step::CloseSegment {
                span: 2000,
                started_at: 0
            }
        );
    }

    #[test]
    fn boundary_beyond_block_defers() {
        let mut acc = accumulator_48k_to_16k();
        acc.set_boundaries([2001]);
        assert_eq!(acc.plan(2000), Step::AdvanceWithinSegment(2000));
    }

    #[test]
    fn two_boundaries_in_one_block_close_two_segments() {
        let mut acc = accumulator_48k_to_16k();
        acc.set_boundaries([500, 1200]);
        let block = vec![0.25f32; 2000];
        let mut closed = Vec::new();
        push_block(&mut acc, &block, &mut closed);

        assert_eq!(closed.len(), 2);
        // [0, 500) and [500, 1200) at ratio 3, [1200, 2000) left buffered.
        assert_eq!(closed[0], (167, 0));
        assert_eq!(closed[1], (233, 500));
        assert_eq!(acc.advancement(), 2000);
        assert_eq!(acc.segment_len(), 267);
        assert_eq!(acc.open_segment_start(), 1200);
    }

    #[test]
    fn segmentation_is_independent_of_block_chunking() {
        let signal: Vec<f32> = (0..2000).map(|i| (i as f32 * 0.01).sin()).collect();

        let mut reference = Vec::new();
        let mut acc = accumulator_48k_to_16k();
        acc.set_boundaries([500, 1200]);
        push_block(&mut acc, &signal, &mut reference);

        for block_len in [1usize, 137, 499, 500, 1999] {
            let mut acc = accumulator_48k_to_16k();
            acc.set_boundaries([500, 1200]);
            let mut closed = Vec::new();
            for block in signal.chunks(block_len) {
                push_block(&mut acc, block, &mut closed);
            }
            assert_eq!(closed, reference, "block_len={block_len}");
            assert_eq!(acc.advancement(), 2000);
        }
    }

    #[test]
    fn advancement_counts_every_pushed_sample() {
        let mut acc = accumulator_48k_to_16k();
        let mut closed = Vec::new();
        for len in [1usize, 31, 997, 4096] {
            push_block(&mut acc, &vec![0.0; len], &mut closed);
        }
        assert_eq!(acc.advancement(), 1 + 31 + 997 + 4096);
        assert!(closed.is_empty());
    }

    #[test]
    fn buffer_grows_by_exact_deficit() {
        let mut acc = accumulator_48k_to_16k();
        acc.absorb(&vec![0.1f32; 300]);
        // ceil(300 / 3) slots allocated on first push.
        assert_eq!(acc.buffer.len(), 100);
        acc.absorb(&vec![0.1f32; 300]);
        assert_eq!(acc.buffer.len(), 200);
        assert!(acc.segment_len() <= acc.buffer.len());
    }

    #[test]
    fn drain_pads_short_segments_with_zeros() {
        let mut acc = accumulator_48k_to_16k();
        acc.absorb(&vec![0.5f32; 300]);
        let buffered = acc.segment_len();
        assert!(buffered < 512);

        let segment = acc.drain_segment(512);
        assert_eq!(segment.len(), 512);
        assert!(segment[buffered..].iter().all(|&s| s == 0.0));
        // Real samples survive in front of the padding.
        assert!(segment[..buffered].iter().any(|&s| s != 0.0));
        assert_eq!(acc.segment_len(), 0);
    }

    #[test]
    fn drain_never_truncates_long_segments() {
        let mut acc = accumulator_48k_to_16k();
        acc.absorb(&vec![0.5f32; 3000]);
        let buffered = acc.segment_len();
        assert_eq!(buffered, 1000);

        let segment = acc.drain_segment(512);
        assert_eq!(segment.len(), buffered);
    }

    #[test]
    fn reset_stream_keeps_boundaries() {
        let mut acc = accumulator_48k_to_16k();
        acc.set_boundaries([500]);
        acc.absorb(&vec![0.0f32; 600]);
        acc.reset_stream();

        assert_eq!(acc.advancement(), 0);
        assert_eq!(acc.segment_len(), 0);
        assert_eq!(acc.schedule().len(), 1);
    }
}
