//! Time-series utilities over canonical bars.
//!
//! - `infer`: estimate the cadence of a series
//! - `gaps`: find holes larger than an expected step
/// Cadence inference.
pub mod infer;
/// Gap detection.
pub mod gaps;
