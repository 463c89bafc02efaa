//! Ticker to instrument-token resolution backed by the exchange CSV dump.

use std::collections::HashMap;

use kitehist_types::KiteError;
use serde::Deserialize;

/// One row of `GET /instruments/{exchange}`; unused columns are ignored.
#[derive(Debug, Deserialize)]
struct InstrumentRow {
    instrument_token: u64,
    tradingsymbol: String,
    #[serde(default)]
    exchange: String,
}

/// Parse an instrument dump into `tradingsymbol -> token`, keeping rows of `exchange`.
///
/// # Errors
/// Returns `Data` when the CSV cannot be read or lacks the expected columns.
pub fn parse_instruments(body: &str, exchange: &str) -> Result<HashMap<String, u64>, KiteError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let mut out = HashMap::new();
    for row in reader.deserialize::<InstrumentRow>() {
        let row = row.map_err(|e| KiteError::Data(format!("instrument dump: {e}")))?;
        if !row.exchange.is_empty() && !row.exchange.eq_ignore_ascii_case(exchange) {
            continue;
        }
        out.entry(row.tradingsymbol.to_ascii_uppercase())
            .or_insert(row.instrument_token);
    }
    Ok(out)
}
