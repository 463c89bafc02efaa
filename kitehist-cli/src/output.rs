use std::io::Write;

use chrono::SecondsFormat;
use kitehist::{HistoryResponse, Symbol};

use crate::error::CliError;

const HEADER: [&str; 7] = ["symbol", "time", "open", "high", "low", "close", "volume"];

/// CSV writer for downloaded bars.
pub struct BarWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> BarWriter<W> {
    pub fn new(out: W) -> Result<Self, CliError> {
        let mut inner = csv::Writer::from_writer(out);
        inner.write_record(HEADER)?;
        Ok(Self { inner })
    }

    pub fn write(&mut self, symbol: &Symbol, resp: &HistoryResponse) -> Result<(), CliError> {
        for bar in resp {
            self.inner.write_record([
                symbol.ticker().to_string(),
                bar.time.to_rfc3339_opts(SecondsFormat::Secs, true),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ])?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), CliError> {
        self.inner.flush()?;
        Ok(())
    }
}
