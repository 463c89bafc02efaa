use serde::{Deserialize, Serialize};

use crate::{Bar, KiteError, Symbol, UnsupportedReason};

/// Bars returned for a supported request, plus non-fatal diagnostics.
///
/// `warnings` carries `DataSourceUnavailable` for windows that failed after
/// retries, `MalformedRecord` for dropped broker records, and `Cancelled` when
/// partial results were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Ordered bars, strictly increasing in time.
    pub bars: Vec<Bar>,
    /// Non-fatal issues encountered while fetching.
    pub warnings: Vec<KiteError>,
}

impl HistoryResponse {
    /// True when at least one window could not be fetched.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.warnings.iter().any(|w| {
            matches!(
                w,
                KiteError::DataSourceUnavailable { .. } | KiteError::Cancelled
            )
        })
    }

    /// Number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// True when no bars were returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Iterate bars in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }
}

impl IntoIterator for HistoryResponse {
    type Item = Bar;
    type IntoIter = std::vec::IntoIter<Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.into_iter()
    }
}

impl<'a> IntoIterator for &'a HistoryResponse {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

/// Three-way result of a history fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryOutcome {
    /// The request was servable; bars may be empty.
    Supported(HistoryResponse),
    /// The request is not servable by this broker; no call was made.
    Unsupported(UnsupportedReason),
    /// The request was servable but the fetch failed.
    Failed(KiteError),
}

impl HistoryOutcome {
    /// Collapse into the nullable contract: `Ok(None)` for unsupported requests.
    ///
    /// # Errors
    /// Returns the failure carried by `Failed`.
    pub fn into_option(self) -> Result<Option<HistoryResponse>, KiteError> {
        match self {
            Self::Supported(resp) => Ok(Some(resp)),
            Self::Unsupported(_) => Ok(None),
            Self::Failed(e) => Err(e),
        }
    }

    /// True for `Unsupported`.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Borrow the response when supported.
    #[must_use]
    pub const fn response(&self) -> Option<&HistoryResponse> {
        match self {
            Self::Supported(resp) => Some(resp),
            _ => None,
        }
    }
}

/// Outcome of one symbol within a bulk download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadEntry {
    /// Symbol that was fetched.
    pub symbol: Symbol,
    /// Result for that symbol.
    pub outcome: HistoryOutcome,
}

/// Aggregated result of a multi-symbol download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReport {
    /// Per-symbol outcomes in request order.
    pub entries: Vec<DownloadEntry>,
    /// Symbol-tagged failures and partial-data warnings.
    pub warnings: Vec<String>,
}

impl DownloadReport {
    /// Entries that produced data.
    pub fn supported(&self) -> impl Iterator<Item = (&Symbol, &HistoryResponse)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.response().map(|r| (&e.symbol, r)))
    }

    /// Entries the broker cannot serve.
    pub fn unsupported(&self) -> impl Iterator<Item = (&Symbol, &UnsupportedReason)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            HistoryOutcome::Unsupported(reason) => Some((&e.symbol, reason)),
            _ => None,
        })
    }
}
