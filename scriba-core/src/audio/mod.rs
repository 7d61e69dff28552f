//! Audio-domain building blocks.
//!
//! The only resident here is the streaming fractional resampler; capture and
//! playback are the host's business; blocks arrive already demultiplexed as
//! mono `f32` slices.

pub mod resample;

pub use resample::FractionalResampler;
