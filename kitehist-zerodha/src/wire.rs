//! Request rendering and response decoding for the historical-candle endpoint.

use chrono::DateTime;
use kitehist_core::{CandleQuery, RawCandle};
use kitehist_types::KiteError;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::NAME;

const QUERY_TIME: &str = "%Y-%m-%d %H:%M:%S";
const CANDLE_TIME: &str = "%Y-%m-%dT%H:%M:%S%z";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    data: Option<CandleData>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandleData {
    #[serde(default)]
    candles: Vec<Vec<Value>>,
}

/// Build `{base}/instruments/historical/{token}/{interval}` with exchange-local bounds.
///
/// # Errors
/// Returns `InvalidArg` if the base URL cannot be joined.
pub fn historical_url(base: &Url, token: u64, query: &CandleQuery) -> Result<Url, KiteError> {
    let mut url = base
        .join(&format!("instruments/historical/{token}/{}", query.interval))
        .map_err(|e| KiteError::InvalidArg(format!("bad base url: {e}")))?;
    let local = |t: chrono::DateTime<chrono::Utc>| {
        t.with_timezone(&query.exchange_tz)
            .format(QUERY_TIME)
            .to_string()
    };
    url.query_pairs_mut()
        .append_pair("from", &local(query.from))
        .append_pair("to", &local(query.to))
        .append_pair("continuous", "0")
        .append_pair("oi", "0");
    Ok(url)
}

/// Map a non-success HTTP status to the error taxonomy.
pub fn status_error(status: StatusCode, headers: &HeaderMap, body: &str) -> KiteError {
    let msg = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    });
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_ms = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1_000));
        return KiteError::RateLimited {
            connector: NAME.to_string(),
            retry_after_ms,
        };
    }
    if status.is_server_error() {
        return KiteError::Server {
            connector: NAME.to_string(),
            status: status.as_u16(),
            msg,
        };
    }
    KiteError::Http {
        connector: NAME.to_string(),
        status: status.as_u16(),
        msg,
    }
}

/// Map a transport failure. Timeouts are transient provider timeouts.
pub fn transport_error(e: &reqwest::Error) -> KiteError {
    if e.is_timeout() {
        return KiteError::provider_timeout(NAME, "history");
    }
    KiteError::Transport {
        connector: NAME.to_string(),
        msg: e.to_string(),
    }
}

fn error_message(body: &str) -> Option<String> {
    let env: Envelope = serde_json::from_str(body).ok()?;
    let msg = env.message?;
    Some(match env.error_type {
        Some(kind) => format!("{kind}: {msg}"),
        None => msg,
    })
}

/// Decode a successful candle response.
///
/// Non-numeric price or volume cells become non-finite or negative values so
/// the normalizer can drop and report the row; an unreadable timestamp or a
/// short row fails the whole response.
///
/// # Errors
/// Returns `Data` for an envelope that is not a success or a row that cannot be read.
pub fn parse_candles(body: &str) -> Result<Vec<RawCandle>, KiteError> {
    let env: Envelope = serde_json::from_str(body)
        .map_err(|e| KiteError::Data(format!("candle response: {e}")))?;
    if env.status != "success" {
        return Err(KiteError::Data(format!(
            "candle response status '{}': {}",
            env.status,
            env.message.unwrap_or_default()
        )));
    }
    let Some(data) = env.data else {
        return Ok(Vec::new());
    };
    data.candles.iter().map(|row| parse_row(row)).collect()
}

fn parse_row(row: &[Value]) -> Result<RawCandle, KiteError> {
    if row.len() < 6 {
        return Err(KiteError::Data(format!(
            "candle row has {} fields, expected at least 6",
            row.len()
        )));
    }
    let stamp = row[0]
        .as_str()
        .ok_or_else(|| KiteError::Data("candle time is not a string".into()))?;
    let time = DateTime::parse_from_str(stamp, CANDLE_TIME)
        .map_err(|e| KiteError::Data(format!("candle time '{stamp}': {e}")))?;
    let px = |v: &Value| v.as_f64().unwrap_or(f64::NAN);
    Ok(RawCandle {
        time,
        open: px(&row[1]),
        high: px(&row[2]),
        low: px(&row[3]),
        close: px(&row[4]),
        volume: row[5]
            .as_i64()
            .or_else(|| row[5].as_f64().map(|v| v as i64))
            .unwrap_or(-1),
        oi: row.get(6).and_then(Value::as_i64),
    })
}
