use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use kitehist_core::{
    BarType, DownloadEntry, DownloadReport, HistoryOutcome, HistoryRequest, KiteError, Resolution,
    Symbol, lookback_start,
};

use crate::{CancelToken, KiteHist};

/// Builder to orchestrate bulk history downloads for multiple symbols.
pub struct DownloadBuilder<'a> {
    pub(crate) kh: &'a KiteHist,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) resolution: Resolution,
    pub(crate) period: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub(crate) bar_type: BarType,
    pub(crate) cancel: CancelToken,
}

impl<'a> DownloadBuilder<'a> {
    /// Create a new builder bound to a `KiteHist` instance.
    ///
    /// Starts with no symbols, minute resolution, trade bars and no period.
    #[must_use]
    pub fn new(kh: &'a KiteHist) -> Self {
        Self {
            kh,
            symbols: Vec::new(),
            resolution: Resolution::Minute,
            period: None,
            bar_type: BarType::TradeBar,
            cancel: CancelToken::new(),
        }
    }

    /// Replace the symbol list.
    ///
    /// # Errors
    /// Returns an error if the same symbol appears twice.
    pub fn symbols(mut self, symbols: &[Symbol]) -> Result<Self, KiteError> {
        let mut seen = HashSet::new();
        for s in symbols {
            if !seen.insert(s) {
                return Err(KiteError::InvalidArg(format!(
                    "duplicate symbol '{s}' in symbols list"
                )));
            }
        }
        self.symbols = symbols.to_vec();
        Ok(self)
    }

    /// Add a single symbol to the list.
    ///
    /// # Errors
    /// Returns an error if the symbol already exists in the list.
    pub fn add_symbol(mut self, symbol: Symbol) -> Result<Self, KiteError> {
        if self.symbols.contains(&symbol) {
            return Err(KiteError::InvalidArg(format!(
                "duplicate symbol '{symbol}' already exists in symbols list"
            )));
        }
        self.symbols.push(symbol);
        Ok(self)
    }

    /// Select the bar resolution.
    #[must_use]
    pub const fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set an explicit period `[start, end]`.
    #[must_use]
    pub const fn period(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.period = Some((start, end));
        self
    }

    /// Set the period as `period` ending at `end`.
    #[must_use]
    pub fn lookback(mut self, end: DateTime<Utc>, period: TimeDelta) -> Self {
        self.period = Some((lookback_start(end, period), end));
        self
    }

    /// Select the bar shape.
    #[must_use]
    pub const fn bar_type(mut self, bar_type: BarType) -> Self {
        self.bar_type = bar_type;
        self
    }

    /// Share a cancellation token with every per-symbol fetch.
    #[must_use]
    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch every symbol concurrently and aggregate the outcomes.
    ///
    /// Entries keep the order of the symbol list. Failed symbols and partial
    /// fetches add `{ticker}: {error}` lines to `warnings` without aborting the batch.
    ///
    /// # Errors
    /// Returns an error only if no symbols or no period are specified, or if the
    /// request-level timeout elapses.
    pub async fn run(self) -> Result<DownloadReport, KiteError> {
        if self.symbols.is_empty() {
            return Err(KiteError::InvalidArg(
                "no symbols specified for download".into(),
            ));
        }
        let Some((start, end)) = self.period else {
            return Err(KiteError::InvalidArg(
                "no period specified for download".into(),
            ));
        };

        let tasks = self.symbols.iter().map(|symbol| {
            let kh = self.kh;
            let cancel = &self.cancel;
            let req = HistoryRequest::new(symbol.clone(), self.resolution, start, end)
                .with_bar_type(self.bar_type);
            async move {
                let outcome = kh.history_with_cancel(req, cancel).await;
                DownloadEntry {
                    symbol: symbol.clone(),
                    outcome,
                }
            }
        });

        let entries = crate::join_with_deadline(tasks, self.kh.cfg.request_timeout)
            .await
            .map_err(|_| KiteError::request_timeout("download:history"))?;

        let mut warnings = Vec::new();
        for entry in &entries {
            let ticker = entry.symbol.ticker();
            match &entry.outcome {
                HistoryOutcome::Failed(e) => warnings.push(format!("{ticker}: {e}")),
                HistoryOutcome::Supported(resp) => warnings.extend(
                    resp.warnings
                        .iter()
                        .filter(|w| !matches!(w, KiteError::MalformedRecord { .. }))
                        .map(|w| format!("{ticker}: {w}")),
                ),
                HistoryOutcome::Unsupported(_) => {}
            }
        }

        Ok(DownloadReport { entries, warnings })
    }
}

impl KiteHist {
    /// Start a multi-symbol download.
    #[must_use]
    pub fn download(&self) -> DownloadBuilder<'_> {
        DownloadBuilder::new(self)
    }
}
