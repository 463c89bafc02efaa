use kitehist_core::{
    CandleQuery, HistoryOutcome, HistoryRequest, HistoryResponse, KiteError, PaginationPlan,
    UnsupportedReason, normalize, stitch,
};

use crate::{CancelToken, KiteHist};

impl KiteHist {
    /// Decide whether `req` is servable and, if so, how it will be paginated.
    ///
    /// The support table is consulted first, then the resolution mapping and the
    /// time range. No provider call is made.
    ///
    /// # Errors
    /// Returns the reason the request cannot be served.
    pub fn plan(&self, req: &HistoryRequest) -> Result<PaginationPlan, UnsupportedReason> {
        self.matrix.check_request(req)?;
        self.mapper.plan_for(req.resolution, req.start, req.end)
    }

    /// Fetch history for `req`.
    ///
    /// Unsupported requests return `Unsupported` without contacting the broker.
    /// Supported requests return every bar that could be fetched; windows that
    /// failed after retries are reported as `DataSourceUnavailable` warnings. When
    /// every window fails the outcome is `Failed`.
    pub async fn history(&self, req: HistoryRequest) -> HistoryOutcome {
        self.history_with_cancel(req, &CancelToken::new()).await
    }

    /// Null-contract adapter over [`KiteHist::history`].
    ///
    /// `Ok(None)` means the request is unsupported; `Ok(Some(resp))` with no bars
    /// means it was supported but the broker had no data.
    ///
    /// # Errors
    /// Returns the failure when the fetch could not produce any data.
    pub async fn history_opt(
        &self,
        req: HistoryRequest,
    ) -> Result<Option<HistoryResponse>, KiteError> {
        self.history(req).await.into_option()
    }

    /// Like [`KiteHist::history`], checking `cancel` before each window.
    ///
    /// By default a cancelled fetch yields `Failed(Cancelled)`. With
    /// `partial_on_cancel` enabled it yields the bars fetched so far plus a
    /// `Cancelled` warning.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "kitehist::history",
            skip(self, req, cancel),
            fields(
                symbol = %req.symbol,
                resolution = %req.resolution,
                start = %req.start,
                end = %req.end,
            ),
        )
    )]
    pub async fn history_with_cancel(
        &self,
        req: HistoryRequest,
        cancel: &CancelToken,
    ) -> HistoryOutcome {
        let plan = match self.plan(&req) {
            Ok(plan) => plan,
            Err(reason) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%reason, "request not servable");
                return HistoryOutcome::Unsupported(reason);
            }
        };

        let fut = self.fetch_plan(&req, &plan, cancel);
        match crate::core::with_request_deadline(self.cfg.request_timeout, fut).await {
            Ok(outcome) => outcome,
            Err(_) => HistoryOutcome::Failed(KiteError::request_timeout("history")),
        }
    }

    async fn fetch_plan(
        &self,
        req: &HistoryRequest,
        plan: &PaginationPlan,
        cancel: &CancelToken,
    ) -> HistoryOutcome {
        let mut responses = Vec::with_capacity(plan.len());
        let mut failures: Vec<KiteError> = Vec::new();
        let mut cancelled = false;

        for window in plan {
            if cancel.is_cancelled() {
                if !self.cfg.partial_on_cancel {
                    return HistoryOutcome::Failed(KiteError::Cancelled);
                }
                cancelled = true;
                break;
            }
            let query = CandleQuery {
                symbol: req.symbol.clone(),
                resolution: req.resolution,
                interval: plan.interval,
                from: window.start,
                to: window.end,
                exchange_tz: req.exchange_tz,
            };
            match self.fetch_window(&query).await {
                Ok(candles) => responses.push(candles),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        symbol = %req.symbol,
                        from = %window.start,
                        to = %window.end,
                        error = %e,
                        "window unavailable after retries"
                    );
                    failures.push(e);
                }
            }
        }

        if !cancelled && !failures.is_empty() && responses.is_empty() {
            let err = if failures.len() == 1 {
                failures.remove(0)
            } else {
                KiteError::DataSourceUnavailable {
                    from: req.start,
                    to: req.end,
                    failures,
                }
            };
            return HistoryOutcome::Failed(err);
        }

        let normalized = normalize(&req.symbol, req.resolution, stitch(responses));
        let mut warnings = failures;
        warnings.extend(normalized.warnings);
        if cancelled {
            warnings.push(KiteError::Cancelled);
        }
        HistoryOutcome::Supported(HistoryResponse {
            bars: normalized.bars,
            warnings,
        })
    }
}
