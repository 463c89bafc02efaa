use crate::RawCandle;

/// Concatenate per-window responses in window order.
///
/// Adjacent windows share a boundary instant, so the same bucket can appear at
/// the tail of one response and the head of the next. Any candle in the
/// accumulated output at or after the first candle of a later response is
/// replaced by that response's copy. Records inside a single response are
/// left untouched for the normalizer to judge.
#[must_use]
pub fn stitch(responses: Vec<Vec<RawCandle>>) -> Vec<RawCandle> {
    let total = responses.iter().map(Vec::len).sum();
    let mut out: Vec<RawCandle> = Vec::with_capacity(total);
    for chunk in responses {
        let Some(head) = chunk.first() else {
            continue;
        };
        let head_time = head.time;
        #[cfg(feature = "tracing")]
        let before = out.len();
        while out.last().is_some_and(|c| c.time >= head_time) {
            out.pop();
        }
        #[cfg(feature = "tracing")]
        if out.len() < before {
            tracing::debug!(
                replaced = before - out.len(),
                "later window superseded overlapping candles"
            );
        }
        out.extend(chunk);
    }
    out
}
