use async_trait::async_trait;
use inspectmap::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Pagination, progress, failure and cancellation behaviour of load sessions
#[cfg(test)]
mod streaming_tests {
    use super::*;

    enum Step {
        Serve(Page),
        Fail,
    }

    /// In-memory page chain that counts its calls and can cancel the session
    /// while a given page is in flight
    struct ScriptedFetcher {
        steps: Vec<(Option<&'static str>, Step)>,
        calls: AtomicUsize,
        cancel_during: Option<(&'static str, CancellationFlag)>,
    }

    impl ScriptedFetcher {
        fn new(steps: Vec<(Option<&'static str>, Step)>) -> Self {
            Self {
                steps,
                calls: AtomicUsize::new(0),
                cancel_during: None,
            }
        }

        fn cancelling_at(mut self, token: &'static str, flag: CancellationFlag) -> Self {
            self.cancel_during = Some((token, flag));
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_page(&self, token: Option<&str>) -> Result<Page> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((at, flag)) = &self.cancel_during {
                if token == Some(*at) {
                    flag.cancel();
                }
            }
            match self.steps.iter().find(|(key, _)| *key == token) {
                Some((_, Step::Serve(page))) => Ok(page.clone()),
                Some((_, Step::Fail)) => Err(MapError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                ))),
                None => Err(MapError::Config(format!("no scripted page for {token:?}"))),
            }
        }
    }

    fn record(i: usize) -> Value {
        json!({
            "longitude": -87.63 + i as f64 * 0.001,
            "latitude": 41.88,
            "inspection_date": format!("2024-01-{:02}", i + 1),
            "results": if i % 2 == 0 { "Pass" } else { "Fail" },
            "dba_name": format!("facility {i}"),
        })
    }

    fn serve(range: std::ops::Range<usize>, next: Option<&str>, total: Option<u64>) -> Step {
        Step::Serve(Page {
            records: range.map(record).collect(),
            next: next.map(String::from),
            total_count: total,
        })
    }

    fn two_pages() -> ScriptedFetcher {
        ScriptedFetcher::new(vec![
            (None, serve(0..2, Some("p2"), Some(3))),
            (Some("p2"), serve(2..3, None, Some(3))),
        ])
    }

    #[tokio::test]
    async fn test_two_page_chain() {
        let fetcher = Arc::new(two_pages());
        let loader = StreamingLoader::new(Arc::clone(&fetcher));

        let mut seen = Vec::new();
        let state = loader
            .load_all(&CancellationFlag::new(), |batch, state| {
                seen.push((batch.len(), state.progress()));
            })
            .await;

        assert_eq!(state.points_loaded.len(), 3);
        assert_eq!(state.pages_fetched, 2);
        assert_eq!(fetcher.calls(), 2);
        assert!(matches!(state.status, LoadStatus::Complete));
        assert_eq!(state.progress(), Progress::Fraction(1.0));

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, 2);
        assert_eq!(seen[0].1, Progress::Fraction(2.0 / 3.0));
        assert_eq!(seen[1], (1, Progress::Fraction(1.0)));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let fetcher = ScriptedFetcher::new(vec![
            (None, serve(0..4, Some("p2"), Some(10))),
            (Some("p2"), serve(4..8, Some("p3"), Some(10))),
            (Some("p3"), serve(8..10, None, Some(10))),
        ]);
        let mut fractions = Vec::new();
        StreamingLoader::new(fetcher)
            .load_all(&CancellationFlag::new(), |_, state| {
                if let Progress::Fraction(f) = state.progress() {
                    fractions.push(f);
                }
            })
            .await;

        assert_eq!(fractions.len(), 3);
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(fractions.last(), Some(&1.0));
    }

    #[tokio::test]
    async fn test_failure_keeps_loaded_points() {
        let fetcher = ScriptedFetcher::new(vec![
            (None, serve(0..2, Some("p2"), Some(4))),
            (Some("p2"), Step::Fail),
        ]);
        let mut map = InspectionMap::new(EngineConfig::default()).unwrap();

        let state = map.load(fetcher).await;

        match &state.status {
            LoadStatus::Failed(err) => {
                assert!(matches!(**err, MapError::PageFetch { page: 2, .. }))
            }
            other => panic!("expected a failed load, got {other:?}"),
        }
        assert_eq!(map.points().len(), 2);
        assert_eq!(map.scene().markers().len(), 2);
        assert!(matches!(map.status(), MapStatus::LoadFailed(_)));
    }

    #[tokio::test]
    async fn test_cancel_discards_in_flight_page() {
        let cancel = CancellationFlag::new();
        let fetcher = Arc::new(
            ScriptedFetcher::new(vec![
                (None, serve(0..2, Some("p2"), Some(6))),
                (Some("p2"), serve(2..4, Some("p3"), Some(6))),
                (Some("p3"), serve(4..6, None, Some(6))),
            ])
            .cancelling_at("p2", cancel.clone()),
        );

        let mut batches = 0;
        let state = StreamingLoader::new(Arc::clone(&fetcher))
            .load_all(&cancel, |_, _| batches += 1)
            .await;

        assert!(matches!(state.status, LoadStatus::Cancelled));
        assert_eq!(state.points_loaded.len(), 2);
        assert_eq!(batches, 1);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_repeated_next_token_stops() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            (None, serve(0..1, Some("p2"), None)),
            (Some("p2"), serve(1..2, Some("p2"), None)),
        ]));
        let state = StreamingLoader::new(Arc::clone(&fetcher))
            .load_all(&CancellationFlag::new(), |_, _| {})
            .await;

        assert!(matches!(state.status, LoadStatus::Failed(_)));
        assert_eq!(state.points_loaded.len(), 2);
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(state.progress(), Progress::Indeterminate);
    }

    #[tokio::test]
    async fn test_first_page_at_initial_token() {
        let fetcher = ScriptedFetcher::new(vec![(Some("p2"), serve(0..3, None, Some(3)))]);
        let state = StreamingLoader::new(fetcher)
            .with_initial_token("p2")
            .load_all(&CancellationFlag::new(), |_, _| {})
            .await;
        assert!(matches!(state.status, LoadStatus::Complete));
        assert_eq!(state.points_loaded.len(), 3);
    }

    #[test]
    fn test_blocking_load() {
        let state =
            StreamingLoader::new(two_pages()).load_all_blocking(&CancellationFlag::new(), |_, _| {});
        assert_eq!(state.points_loaded.len(), 3);
        assert_eq!(state.summary().points_loaded, 3);
    }

    #[test]
    fn test_elapsed_excludes_batch_callbacks() {
        let state = StreamingLoader::new(two_pages()).load_all_blocking(
            &CancellationFlag::new(),
            |_, _| std::thread::sleep(Duration::from_millis(40)),
        );
        assert_eq!(state.pages_fetched, 2);
        // Two 40ms renders, in-memory fetches only
        assert!(state.elapsed < Duration::from_millis(40), "{:?}", state.elapsed);
    }

    async fn wait_for(load: &BackgroundLoad) {
        while !load.is_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_background_load_pumped_into_map() {
        let mut map = InspectionMap::new(EngineConfig::default()).unwrap();
        let load = map.start_background(two_pages());
        assert_eq!(Some(load.session()), map.session());

        wait_for(&load).await;
        let applied = map.pump(&load);

        assert_eq!(applied, 2);
        assert_eq!(map.points().len(), 3);
        assert!(matches!(map.status(), MapStatus::Ready));
        let summary = map.stream_summary().unwrap();
        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(summary.progress, Progress::Fraction(1.0));
    }

    #[tokio::test]
    async fn test_superseded_session_is_ignored() {
        let mut map = InspectionMap::new(EngineConfig::default()).unwrap();
        let first = map.start_background(two_pages());
        let second = map.start_background(ScriptedFetcher::new(vec![(
            None,
            serve(10..11, None, Some(1)),
        )]));

        wait_for(&first).await;
        wait_for(&second).await;

        assert_eq!(map.pump(&first), 0);
        assert_eq!(map.pump(&second), 1);
        assert_eq!(map.points().len(), 1);
        assert_eq!(map.points()[0].label, "facility 10");
        assert_eq!(map.session(), Some(second.session()));
        assert!(matches!(map.status(), MapStatus::Ready));
    }
}
