//! kitehist-core
//!
//! Broker-independent building blocks for historical bar retrieval.
//!
//! - `connector`: the `CandleProvider` trait and broker-native candle records.
//! - `matrix`: the declarative support table deciding which requests are servable.
//! - `range`: time-range validation.
//! - `plan`: resolution to interval mapping and pagination into per-call windows.
//! - `stitch` / `normalize`: merge window responses and convert them to canonical bars.
//! - `timeseries`: cadence inference and gap detection over bar series.
#![warn(missing_docs)]

/// Connector trait and raw candle records.
pub mod connector;
/// Support table for market, security type, resolution and bar type.
pub mod matrix;
/// Middleware trait implemented by provider wrappers.
pub mod middleware;
/// Conversion of raw candles into canonical bars.
pub mod normalize;
/// Interval mapping and window planning.
pub mod plan;
/// Time-range validation.
pub mod range;
/// Boundary-aware concatenation of window responses.
pub mod stitch;
/// Time-series utilities over canonical bars.
pub mod timeseries;

pub use connector::{CandleProvider, CandleQuery, RawCandle};
pub use matrix::{Dimension, Pattern, SupportEntry, SupportMatrix, SupportMatrixBuilder, Verdict};
pub use middleware::Middleware;
pub use normalize::{Normalized, normalize};
pub use plan::{IntervalPolicy, PaginationPlan, ResolutionMapper, Window};
pub use range::{is_valid_range, validate_range};
pub use stitch::stitch;
pub use timeseries::gaps::{Gap, detect_gaps};
pub use timeseries::infer::estimate_step_seconds;

pub use kitehist_types::*;
