//! Streaming fractional-phase sample-rate conversion.
//!
//! ## Design
//!
//! Hosts deliver audio at whatever rate the stream was recorded at; the
//! recognition engine wants a fixed rate (16 kHz). `FractionalResampler`
//! bridges that gap one block at a time: it keeps the 5 most recently
//! consumed input samples in a ring and a fractional phase, and emits each
//! output sample as a 4th-order Lagrange interpolation over the ring. Phase
//! and history survive across calls, so splitting the input into arbitrary
//! sub-blocks produces bit-identical output to one unbroken call.
//!
//! ## Usage
//!
//! ```
//! use scriba_core::audio::FractionalResampler;
//!
//! let mut rs = FractionalResampler::new();
//! rs.prepare(48_000.0);
//! rs.set_target_sample_rate(16_000.0);
//! let input = vec![0.0f32; 3000];
//! let mut output = vec![0.0f32; 1000];
//! let (consumed, produced) = rs.process(&input, &mut output);
//! assert_eq!((consumed, produced), (3000, 1000));
//! ```

use tracing::error;

/// Number of retained input samples; interpolation nodes sit at −2..=+2.
const HISTORY_LEN: usize = 5;

/// Streaming resampler converting f32 mono audio between two fixed rates.
#[derive(Debug, Clone)]
pub struct FractionalResampler {
    source_rate: f64,
    target_rate: f64,
    /// Circular history of the last consumed input samples. `write_index`
    /// points at the oldest retained sample (the next slot to overwrite).
    history: [f32; HISTORY_LEN],
    write_index: usize,
    /// Input samples (fractional) still owed before the next input sample
    /// must be shifted into history. Starts at 1.0 so the first input sample
    /// is consumed before any output is produced.
    sub_sample_pos: f64,
}

impl FractionalResampler {
    pub fn new() -> Self {
        Self {
            source_rate: 48_000.0,
            target_rate: 16_000.0,
            history: [0.0; HISTORY_LEN],
            write_index: 0,
            sub_sample_pos: 1.0,
        }
    }

    /// Set the source rate and reset all streaming state.
    pub fn prepare(&mut self, source_rate: f64) {
        self.source_rate = source_rate;
        self.reset();
    }

    /// Change the output rate. The conversion ratio is recomputed on the
    /// next `process` call; streaming state is untouched.
    pub fn set_target_sample_rate(&mut self, target_rate: f64) {
        self.target_rate = target_rate;
    }

    /// Input samples consumed per output sample produced.
    pub fn ratio(&self) -> f64 {
        self.source_rate / self.target_rate
    }

    pub fn source_rate(&self) -> f64 {
        self.source_rate
    }

    pub fn target_rate(&self) -> f64 {
        self.target_rate
    }

    /// Zero the history, rewind the write index and restore the initial
    /// phase of 1.0.
    pub fn reset(&mut self) {
        self.history = [0.0; HISTORY_LEN];
        self.write_index = 0;
        self.sub_sample_pos = 1.0;
    }

    /// Stream `input` into `output`, returning `(consumed, produced)`.
    ///
    /// Consumes at most `input.len()` samples and produces at most
    /// `output.len()`. Any input left over once the output budget is filled
    /// is still absorbed into the history ring (without producing output)
    /// while the phase allows, so state stays current for the next call.
    ///
    /// This operation cannot fail. `consumed < input.len()` on return means
    /// the caller under-sized `output` relative to the configured ratio,
    /// a contract error in the integration, logged by the caller.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> (usize, usize) {
        let ratio = self.ratio();
        let mut consumed = 0usize;
        let mut produced = 0usize;
        let mut pos = self.sub_sample_pos;

        while consumed < input.len() && produced < output.len() {
            while pos >= 1.0 && consumed < input.len() {
                self.push_history(input[consumed]);
                consumed += 1;
                pos -= 1.0;
            }
            if pos < 1.0 {
                output[produced] = self.interpolate(pos);
                produced += 1;
                pos += ratio;
            }
        }

        // Trailing pass: absorb whatever input the phase still owes, even
        // though no further output fits.
        while pos >= 1.0 && consumed < input.len() {
            self.push_history(input[consumed]);
            consumed += 1;
            pos -= 1.0;
        }

        self.sub_sample_pos = pos;
        (consumed, produced)
    }

    fn push_history(&mut self, sample: f32) {
        self.history[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % HISTORY_LEN;
    }

    /// One output sample at fractional offset `t` ∈ [0, 1): the retained
    /// samples sit on unit-spaced nodes −2..=+2 (oldest first), and the
    /// output is Σₖ history[k] · lₖ(t).
    fn interpolate(&self, t: f64) -> f32 {
        let mut acc = 0.0f64;
        let mut slot = self.write_index; // oldest retained sample
        for k in 0..HISTORY_LEN {
            acc += f64::from(self.history[slot]) * lagrange_basis(k, t);
            slot = (slot + 1) % HISTORY_LEN;
        }
        acc as f32
    }
}

impl Default for FractionalResampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Value at `t` of the k-th 4th-order Lagrange basis polynomial over the
/// nodes −2, −1, 0, 1, 2:
///
/// ```text
/// lₖ(t) = Π_{j≠k} (t − (j − 2)) / (k − j)
/// ```
fn lagrange_basis(k: usize, t: f64) -> f64 {
    let mut weight = 1.0f64;
    for j in 0..HISTORY_LEN {
        if j != k {
            let node = j as f64 - 2.0;
            weight *= (t - node) / (k as f64 - j as f64);
        }
    }
    weight
}

/// Output slots needed to resample `input_len` source samples at `ratio`
/// input-samples-per-output. The streaming invariant (phase ≥ 0, output only
/// while phase < 1) bounds production by this value.
pub(crate) fn max_output_len(input_len: usize, source_rate: f64, target_rate: f64) -> usize {
    (input_len as f64 * target_rate / source_rate).ceil() as usize
}

/// Log helper for the under-sized-output contract error. Kept next to the
/// resampler so every call site reports it identically.
pub(crate) fn warn_short_consumption(expected: usize, consumed: usize) {
    if consumed != expected {
        error!(
            expected,
            consumed, "resampler consumed fewer samples than supplied, output buffer under-sized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tone(len: usize, freq: f64, rate: f64) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / rate).sin() as f32)
            .collect()
    }

    /// Resample `input` in one shot with a fresh converter.
    fn one_shot(input: &[f32], source: f64, target: f64) -> (usize, Vec<f32>) {
        let mut rs = FractionalResampler::new();
        rs.prepare(source);
        rs.set_target_sample_rate(target);
        let mut out = vec![0.0f32; max_output_len(input.len(), source, target)];
        let (consumed, produced) = rs.process(input, &mut out);
        out.truncate(produced);
        (consumed, out)
    }

    #[test]
    fn basis_is_a_partition_of_unity() {
        for &t in &[0.0, 0.1, 0.25, 0.5, 0.75, 0.999] {
            let sum: f64 = (0..HISTORY_LEN).map(|k| lagrange_basis(k, t)).sum();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn basis_is_cardinal_at_the_nodes() {
        for k in 0..HISTORY_LEN {
            for j in 0..HISTORY_LEN {
                let node = j as f64 - 2.0;
                let expected = if j == k { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(lagrange_basis(k, node), expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn basis_reproduces_cubic_polynomials_exactly() {
        // Degree ≤ 4 polynomials must interpolate exactly; check a cubic.
        let p = |x: f64| 0.5 * x * x * x - 1.25 * x * x + 2.0 * x - 0.75;
        for &t in &[0.2, 0.5, 0.83] {
            let interpolated: f64 = (0..HISTORY_LEN)
                .map(|k| p(k as f64 - 2.0) * lagrange_basis(k, t))
                .sum();
            assert_abs_diff_eq!(interpolated, p(t), epsilon = 1e-10);
        }
    }

    #[test]
    fn ratio_3_produces_exactly_one_third() {
        let input = tone(3000, 440.0, 48_000.0);
        let (consumed, out) = one_shot(&input, 48_000.0, 16_000.0);
        assert_eq!(consumed, 3000);
        assert_eq!(out.len(), 1000);
    }

    #[test]
    fn upsampling_doubles_output() {
        let input = tone(100, 200.0, 16_000.0);
        let (consumed, out) = one_shot(&input, 16_000.0, 32_000.0);
        assert_eq!(consumed, 100);
        assert_eq!(out.len(), 200);
    }

    #[test]
    fn chunked_processing_is_bit_identical_to_one_call() {
        let source = 44_100.0;
        let target = 16_000.0;
        let input = tone(4410, 330.0, source);
        let (_, reference) = one_shot(&input, source, target);

        // Awkward, coprime-ish chunk sizes to exercise every phase state.
        for chunks in [
            &[4410usize][..],
            &[1, 4409],
            &[7, 13, 4390],
            &[997, 997, 997, 997, 422],
        ] {
            let mut rs = FractionalResampler::new();
            rs.prepare(source);
            rs.set_target_sample_rate(target);
            let mut out = Vec::new();
            let mut offset = 0usize;
            for &len in chunks {
                let len = len.min(input.len() - offset);
                let chunk = &input[offset..offset + len];
                let mut buf = vec![0.0f32; max_output_len(len, source, target)];
                let (consumed, produced) = rs.process(chunk, &mut buf);
                assert_eq!(consumed, len, "chunk not fully consumed");
                out.extend_from_slice(&buf[..produced]);
                offset += len;
            }
            // Bit-identical, not approximately equal.
            assert_eq!(out, reference, "split {chunks:?} diverged");
        }
    }

    #[test]
    fn sample_conservation_across_random_blocks() {
        let source = 48_000.0;
        let target = 16_000.0;
        let input = tone(9600, 500.0, source);
        let mut rs = FractionalResampler::new();
        rs.prepare(source);
        rs.set_target_sample_rate(target);

        let mut total_consumed = 0usize;
        let mut offset = 0usize;
        // Deterministic pseudo-random block lengths.
        let mut len = 1usize;
        while offset < input.len() {
            len = (len * 31 + 17) % 512 + 1;
            let take = len.min(input.len() - offset);
            let mut buf = vec![0.0f32; max_output_len(take, source, target)];
            let (consumed, _) = rs.process(&input[offset..offset + take], &mut buf);
            total_consumed += consumed;
            offset += take;
        }
        assert_eq!(total_consumed, input.len());
    }

    #[test]
    fn reset_restores_initial_behaviour() {
        let input = tone(960, 1000.0, 48_000.0);
        let (_, fresh) = one_shot(&input, 48_000.0, 16_000.0);

        let mut rs = FractionalResampler::new();
        rs.prepare(48_000.0);
        rs.set_target_sample_rate(16_000.0);
        let mut scratch = vec![0.0f32; 2048];
        rs.process(&tone(777, 50.0, 48_000.0), &mut scratch);
        rs.reset();

        let mut out = vec![0.0f32; max_output_len(input.len(), 48_000.0, 16_000.0)];
        let (_, produced) = rs.process(&input, &mut out);
        out.truncate(produced);
        assert_eq!(out, fresh);
    }

    #[test]
    fn zero_output_budget_reports_short_consumption() {
        let mut rs = FractionalResampler::new();
        rs.prepare(48_000.0);
        rs.set_target_sample_rate(16_000.0);
        let input = vec![0.5f32; 10];
        let (consumed, produced) = rs.process(&input, &mut []);
        // Initial phase of 1.0 lets exactly one sample be absorbed before an
        // output would be due; the rest must wait for capacity.
        assert_eq!(produced, 0);
        assert_eq!(consumed, 1);
    }
}
