//! Externally supplied segmentation positions.

use std::collections::BTreeSet;
use std::ops::Bound;

/// Ordered set of source-sample positions at which the stream must be cut.
///
/// Supplied once before a run and treated as read-only while it lasts;
/// `replace` swaps the whole set between runs. Positions are unique and
/// ascending by construction.
#[derive(Debug, Clone, Default)]
pub struct BoundarySchedule {
    cuts: BTreeSet<u64>,
}

impl BoundarySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schedule from positions expressed in seconds at `source_rate`.
    pub fn from_seconds(times: impl IntoIterator<Item = f64>, source_rate: f64) -> Self {
        let cuts = times
            .into_iter()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .map(|t| (t * source_rate).round() as u64)
            .collect();
        Self { cuts }
    }

    /// Replace the whole schedule. Incremental mutation during a run is not
    /// supported; a new set must be installed between runs.
    pub fn replace(&mut self, positions: impl IntoIterator<Item = u64>) {
        self.cuts = positions.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.cuts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    /// First boundary strictly greater than `position`. Strictness matters:
    /// a boundary the stream already sits on was honoured when it was
    /// crossed and must not fire again.
    pub fn next_after(&self, position: u64) -> Option<u64> {
        self.cuts
            .range((Bound::Excluded(position), Bound::Unbounded))
            .next()
            .copied()
    }

    /// Greatest boundary at or before `position`, i.e. the start of the segment
    /// `position` falls in. Stream start when no boundary precedes it.
    pub fn segment_start(&self, position: u64) -> u64 {
        self.cuts.range(..=position).next_back().copied().unwrap_or(0)
    }
}

impl FromIterator<u64> for BoundarySchedule {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            cuts: iter.into_iter().collect(),
        }
    }
}
