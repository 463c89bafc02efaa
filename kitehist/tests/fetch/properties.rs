use std::sync::Arc;

use chrono::TimeDelta;
use kitehist::{HistoryRequest, Resolution, ResolutionMapper};
use kitehist_mock::MockProvider;
use proptest::prelude::*;

use crate::helpers::{builder_with, equity, ist};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn bars_are_ordered_consistent_and_repeatable(
        start_min in 0i64..300,
        len_min in 1i64..600,
        span_min in 5i64..120,
    ) {
        tokio_test::block_on(async move {
            let kh = builder_with(Arc::new(MockProvider::new()))
                .resolution_mapper(
                    ResolutionMapper::kite()
                        .with_max_span(Resolution::Minute, TimeDelta::minutes(span_min)),
                )
                .build()
                .unwrap();
            let start = ist(2024, 6, 4, 9, 15) + TimeDelta::minutes(start_min);
            let req = HistoryRequest::new(
                equity("SBIN"),
                Resolution::Minute,
                start,
                start + TimeDelta::minutes(len_min),
            );

            let first = kh.history_opt(req.clone()).await.unwrap().unwrap();
            assert!(first.warnings.is_empty());
            for pair in first.bars.windows(2) {
                assert!(pair[0].time < pair[1].time);
            }
            assert!(first.iter().all(|b| b.is_consistent()));
            assert!(first.iter().all(|b| b.time >= req.start && b.time <= req.end));

            let again = kh.history_opt(req).await.unwrap().unwrap();
            assert_eq!(first, again);
        });
    }
}
