use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::{Bar, KiteError, RawCandle, Resolution, Symbol};

/// Bars that passed validation plus one warning per dropped record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Valid bars, strictly increasing in time.
    pub bars: Vec<Bar>,
    /// `MalformedRecord` warnings for dropped input.
    pub warnings: Vec<KiteError>,
}

fn price(v: f64, field: &str) -> Result<Decimal, String> {
    if !v.is_finite() {
        return Err(format!("{field} is not finite"));
    }
    if v < 0.0 {
        return Err(format!("{field} is negative"));
    }
    Decimal::from_f64(v).ok_or_else(|| format!("{field} {v} is not representable"))
}

fn to_bar(
    c: &RawCandle,
    time: DateTime<Utc>,
    symbol: &Symbol,
    resolution: Resolution,
) -> Result<Bar, String> {
    let volume =
        u64::try_from(c.volume).map_err(|_| format!("volume {} is negative", c.volume))?;
    let bar = Bar {
        time,
        symbol: symbol.clone(),
        resolution,
        open: price(c.open, "open")?,
        high: price(c.high, "high")?,
        low: price(c.low, "low")?,
        close: price(c.close, "close")?,
        volume,
    };
    if !bar.is_consistent() {
        return Err(format!(
            "OHLC envelope violated (o={}, h={}, l={}, c={})",
            bar.open, bar.high, bar.low, bar.close
        ));
    }
    Ok(bar)
}

/// Convert broker candles into canonical bars.
///
/// Records that are non-finite, negative, outside the OHLC envelope, or not
/// strictly later than the last kept bar are dropped and reported as
/// `MalformedRecord` warnings. Timestamps are converted to UTC.
#[must_use]
pub fn normalize(symbol: &Symbol, resolution: Resolution, raw: Vec<RawCandle>) -> Normalized {
    let mut out = Normalized {
        bars: Vec::with_capacity(raw.len()),
        warnings: Vec::new(),
    };
    for c in raw {
        let time = c.time.with_timezone(&Utc);
        let verdict = match out.bars.last() {
            Some(prev) if prev.time >= time => Err(format!(
                "timestamp {time} does not follow previous bar at {}",
                prev.time
            )),
            _ => to_bar(&c, time, symbol, resolution),
        };
        match verdict {
            Ok(bar) => out.bars.push(bar),
            Err(reason) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    symbol = %symbol,
                    %time,
                    %reason,
                    "dropping malformed candle"
                );
                out.warnings.push(KiteError::malformed(Some(time), reason));
            }
        }
    }
    out
}
