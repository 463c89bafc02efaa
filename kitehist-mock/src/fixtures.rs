use chrono::{DateTime, Datelike, TimeDelta, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use kitehist_core::{RawCandle, Resolution};

/// 09:15 local.
const SESSION_OPEN: u32 = 9 * 3_600 + 15 * 60;
/// 15:30 local.
const SESSION_CLOSE: u32 = 15 * 3_600 + 30 * 60;

/// Bucket step and its phase, both in seconds since local midnight.
const fn grid(resolution: Resolution) -> Option<(i64, i64)> {
    match resolution {
        Resolution::Minute => Some((60, 0)),
        Resolution::Hour => Some((3_600, 15 * 60)),
        Resolution::Daily => Some((86_400, 0)),
        Resolution::Tick | Resolution::Second => None,
    }
}

fn in_session(resolution: Resolution, local: DateTime<Tz>) -> bool {
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    if resolution == Resolution::Daily {
        return true;
    }
    (SESSION_OPEN..SESSION_CLOSE).contains(&local.num_seconds_from_midnight())
}

fn seed(ticker: &str) -> i64 {
    ticker.bytes().map(i64::from).sum::<i64>() % 900
}

/// Deterministic candle for `ticker` at bucket `t`.
pub fn candle_at(ticker: &str, resolution: Resolution, tz: Tz, t: DateTime<Utc>) -> RawCandle {
    let step = grid(resolution).map_or(60, |(s, _)| s);
    let slot = t.timestamp().div_euclid(step);
    let base = 100 + seed(ticker);
    // Whole paise keep the f64 values short and exact enough for decimal conversion.
    let open_paise = base * 100 + slot.rem_euclid(50) * 5;
    let px = |paise: i64| paise as f64 / 100.0;
    RawCandle {
        time: t.with_timezone(&tz).fixed_offset(),
        open: px(open_paise),
        high: px(open_paise + 25),
        low: px(open_paise - 15),
        close: px(open_paise + 10),
        volume: 1_000 + slot.rem_euclid(97) * 10,
        oi: None,
    }
}

/// Session-aligned candles for every bucket in `from..=to`.
///
/// Both endpoints are inclusive, so adjacent windows sharing a boundary both
/// report the boundary bucket.
pub fn session_candles(
    ticker: &str,
    resolution: Resolution,
    tz: Tz,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<RawCandle> {
    let Some((step, phase)) = grid(resolution) else {
        return Vec::new();
    };
    let offset = i64::from(
        from.with_timezone(&tz)
            .fixed_offset()
            .offset()
            .local_minus_utc(),
    );
    let mut first = from.timestamp();
    if from.timestamp_subsec_nanos() > 0 {
        first += 1;
    }
    let r = (first + offset - phase).rem_euclid(step);
    if r != 0 {
        first += step - r;
    }

    let mut out = Vec::new();
    let Some(mut t) = DateTime::from_timestamp(first, 0) else {
        return out;
    };
    while t <= to {
        if in_session(resolution, t.with_timezone(&tz)) {
            out.push(candle_at(ticker, resolution, tz, t));
        }
        t += TimeDelta::seconds(step);
    }
    out
}
