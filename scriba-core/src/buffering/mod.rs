//! Segmentation and accumulation of the resampled stream.
//!
//! `BoundarySchedule` holds the externally supplied cut positions;
//! `SegmentAccumulator` drives the resampler across host blocks and decides,
//! per iteration, whether the stream advances within the current segment or
//! a segment closes at a boundary.

pub mod accumulator;
pub mod boundary;

pub use accumulator::{SegmentAccumulator, Step};
pub use boundary::BoundarySchedule;
