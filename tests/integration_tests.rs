use async_trait::async_trait;
use inspectmap::prelude::*;
use serde_json::{json, Value};
use std::time::Duration;

/// End-to-end runs of the map engine against scripted page chains
#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Serves a fixed page chain from memory
    struct ScriptedFetcher {
        pages: Vec<(Option<&'static str>, Page)>,
    }

    impl ScriptedFetcher {
        fn new(pages: Vec<(Option<&'static str>, Page)>) -> Self {
            Self { pages }
        }

        fn single(records: Vec<Value>) -> Self {
            let total = records.len() as u64;
            Self::new(vec![(None, page(records, None, Some(total)))])
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_page(&self, token: Option<&str>) -> Result<Page> {
            self.pages
                .iter()
                .find(|(key, _)| *key == token)
                .map(|(_, page)| page.clone())
                .ok_or_else(|| MapError::Config(format!("no scripted page for {token:?}")))
        }
    }

    fn page(records: Vec<Value>, next: Option<&str>, total: Option<u64>) -> Page {
        Page {
            records,
            next: next.map(String::from),
            total_count: total,
        }
    }

    fn record(lng: f64, lat: f64, date: &str, result: &str, name: &str) -> Value {
        json!({
            "longitude": lng,
            "latitude": lat,
            "inspection_date": date,
            "results": result,
            "dba_name": name,
        })
    }

    /// Three side-by-side regions just west of downtown
    fn three_regions() -> &'static str {
        r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "ZIP": "Z1" },
                  "geometry": { "type": "Polygon", "coordinates":
                    [[[-87.66,41.86],[-87.64,41.86],[-87.64,41.90],[-87.66,41.90],[-87.66,41.86]]] } },
                { "type": "Feature", "properties": { "ZIP": "Z2" },
                  "geometry": { "type": "Polygon", "coordinates":
                    [[[-87.64,41.86],[-87.62,41.86],[-87.62,41.90],[-87.64,41.90],[-87.64,41.86]]] } },
                { "type": "Feature", "properties": { "ZIP": "Z3" },
                  "geometry": { "type": "Polygon", "coordinates":
                    [[[-87.62,41.86],[-87.60,41.86],[-87.60,41.90],[-87.62,41.90],[-87.62,41.86]]] } }
            ]
        }"#
    }

    fn map_with_regions() -> InspectionMap {
        let mut map = InspectionMap::new(EngineConfig::default()).unwrap();
        map.load_boundaries_str(three_regions()).unwrap();
        map
    }

    #[tokio::test]
    async fn test_region_counts_and_baseline() {
        let mut map = map_with_regions();
        let fetcher = ScriptedFetcher::single(vec![
            record(-87.65, 41.88, "2024-01-02", "Pass", "Cafe One"),
            record(-87.655, 41.87, "2024-01-03", "Fail", "Cafe Two"),
            record(-87.63, 41.88, "2024-01-04", "Pass", "Deli"),
        ]);

        map.load(fetcher).await;

        let counts = map.region_counts().unwrap();
        assert_eq!(counts.get("Z1"), 2);
        assert_eq!(counts.get("Z2"), 1);
        assert_eq!(counts.get("Z3"), 0);

        let scene = map.scene();
        assert_eq!(scene.region("Z3").unwrap().fill(), BASELINE_COLOR);
        assert_ne!(scene.region("Z1").unwrap().fill(), BASELINE_COLOR);
        assert_ne!(
            scene.region("Z1").unwrap().fill(),
            scene.region("Z2").unwrap().fill()
        );

        let z1 = counts.totals("Z1").unwrap();
        assert_eq!(z1.passed_inspections, Some(1));
        assert_eq!(z1.failed_inspections, Some(1));
    }

    #[tokio::test]
    async fn test_counts_conserve_points() {
        let mut map = map_with_regions();
        let fetcher = ScriptedFetcher::single(vec![
            record(-87.65, 41.88, "2024-01-02", "Pass", "a"),
            record(-87.63, 41.88, "2024-01-02", "Pass", "b"),
            record(-87.61, 41.88, "2024-01-02", "Fail", "c"),
            // Outside every region
            record(-87.70, 41.95, "2024-01-02", "Pass", "d"),
        ]);

        map.load(fetcher).await;

        let counts = map.region_counts().unwrap();
        assert_eq!(counts.assigned() + counts.unassigned(), map.points().len() as u64);
        assert_eq!(counts.unassigned(), 1);
    }

    #[tokio::test]
    async fn test_reveal_follows_timestamps() {
        let mut config = EngineConfig::default();
        config.markers.stagger_ms = 100;
        let mut map = InspectionMap::new(config).unwrap();

        let fetcher = ScriptedFetcher::single(vec![
            record(-87.63, 41.88, "2024-03-03", "Pass", "third"),
            record(-87.62, 41.88, "2024-03-01", "Pass", "first"),
            record(-87.61, 41.88, "2024-03-02", "Fail", "second"),
        ]);
        map.load(fetcher).await;

        let scene = map.scene();
        let delays: Vec<Duration> = scene
            .markers()
            .iter()
            .map(|m| m.transition.delay)
            .collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_millis(100),
                Duration::from_millis(200)
            ]
        );
        let labels: Vec<&str> = scene.markers().iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_malformed_record_skipped() {
        let mut map = InspectionMap::new(EngineConfig::default()).unwrap();
        let mut records = vec![
            record(-87.63, 41.88, "2024-01-01", "Pass", "a"),
            record(-87.62, 41.88, "2024-01-02", "Pass", "b"),
            record(-87.61, 41.88, "2024-01-03", "Fail", "c"),
            record(-87.60, 41.88, "2024-01-04", "Pass", "d"),
        ];
        records.insert(
            2,
            json!({ "longitude": -87.6, "inspection_date": "2024-01-05", "results": "Pass" }),
        );

        let state = map.load(ScriptedFetcher::single(records)).await;

        assert_eq!(state.points_loaded.len(), 4);
        assert_eq!(state.skipped_records, 1);
        assert_eq!(state.progress(), Progress::Fraction(0.8));
        assert_eq!(map.stream_summary().unwrap().progress, Progress::Fraction(0.8));
        assert_eq!(map.scene().markers().len(), 4);
        assert!(matches!(map.status(), MapStatus::Ready));
    }

    #[tokio::test]
    async fn test_empty_dataset() {
        let mut map = map_with_regions();
        map.load(ScriptedFetcher::single(Vec::new())).await;

        assert!(matches!(map.status(), MapStatus::Empty));
        let scene = map.scene();
        assert_eq!(scene.regions().len(), 3);
        assert!(scene.regions().iter().all(|r| r.fill() == BASELINE_COLOR));
        assert!(scene.markers().is_empty());
    }

    #[tokio::test]
    async fn test_aggregates_drive_choropleth() {
        let mut map = map_with_regions();
        map.set_aggregates(
            RegionAggregates::from_json_str(
                r#"{ "Z1": { "total": 10, "passed": 7, "failed": 3 }, "Z2": { "total": 5 } }"#,
            )
            .unwrap(),
        );

        assert!(matches!(map.status(), MapStatus::Ready));
        let counts = map.region_counts().unwrap();
        assert_eq!(counts.get("Z1"), 10);
        assert_eq!(counts.get("Z3"), 0);

        // Hovering a region shows the backend totals
        let inside_z2 = map.projection().project_lng_lat(-87.63, 41.87);
        let tip = map
            .handle_pointer(PointerEvent::Move {
                position: inside_z2,
            })
            .unwrap();
        assert_eq!(tip.content, "ZIP: Z2\nTotal Inspections: 5\nPassed: N/A\nFailed: N/A");
    }

    #[tokio::test]
    async fn test_density_mode_switch() {
        let mut map = map_with_regions();
        let changes = map.subscribe();
        let records = (0..20)
            .map(|i| record(-87.63 + i as f64 * 0.0005, 41.88, "2024-01-01", "Pass", "x"))
            .collect();
        map.load(ScriptedFetcher::single(records)).await;
        let markers_before = map.scene().markers().to_vec();

        map.set_mode(AggregationMode::KernelDensity);

        let scene = map.scene();
        assert_eq!(map.mode(), AggregationMode::KernelDensity);
        assert_eq!(scene.markers(), markers_before.as_slice());
        let density = scene.density().unwrap();
        assert!(density.painted_cells() > 0);
        assert!(map.region_counts().is_none());

        let kinds: Vec<ChangeKind> = changes.try_iter().map(|c| c.kind).collect();
        assert!(matches!(kinds.first(), Some(ChangeKind::SessionStarted(_))));
        assert_eq!(
            kinds.last(),
            Some(&ChangeKind::ModeSwitch(AggregationMode::KernelDensity))
        );
        assert!(kinds
            .iter()
            .any(|k| matches!(k, ChangeKind::NewBatch { added: 20, .. })));
    }

    #[tokio::test]
    async fn test_tap_toggles_marker_tooltip() {
        let mut map =
            InspectionMap::with_capabilities(EngineConfig::default(), InputCapabilities::touch())
                .unwrap();
        assert_eq!(map.interaction_mode(), InteractionMode::Tap);
        map.load(ScriptedFetcher::single(vec![record(
            -87.6298,
            41.8781,
            "2024-05-06",
            "Pass w/ Conditions",
            "Corner Grill",
        )]))
        .await;

        let center = map.scene().markers()[0].position;

        // Hover is meaningless on touch devices
        assert!(map
            .handle_pointer(PointerEvent::Move { position: center })
            .is_none());

        let tip = map
            .handle_pointer(PointerEvent::Tap { position: center })
            .unwrap();
        assert_eq!(
            tip.content,
            "Corner Grill\nDate: 2024-05-06\nResult: Pass w/ Conditions"
        );
        assert!(map
            .handle_pointer(PointerEvent::Tap { position: center })
            .is_none());
    }

    #[test]
    fn test_open_tooltip_follows_facility_across_batches() {
        let mut map =
            InspectionMap::with_capabilities(EngineConfig::default(), InputCapabilities::touch())
                .unwrap();
        let point = |lng, date, name| {
            GeographicPoint::from_record(&record(lng, 41.8781, date, "Pass", name)).unwrap()
        };
        let (session, _) = map.begin_session();
        let summary = StreamState::new(session).summary();

        map.apply_batch(session, &[point(-87.6298, "2024-03-10", "Alpha")], summary.clone());
        let alpha = map.scene().markers()[0].position;
        let tip = map
            .handle_pointer(PointerEvent::Tap { position: alpha })
            .unwrap();
        assert!(tip.content.starts_with("Alpha\n"));

        // An earlier inspection now reveals first and takes Alpha's slot
        map.apply_batch(session, &[point(-87.61, "2024-03-01", "Beta")], summary);
        assert_eq!(map.scene().markers()[0].label, "Beta");
        assert_eq!(map.scene().markers()[1].position, alpha);
        assert!(map.tooltip().unwrap().content.starts_with("Alpha\n"));

        assert!(map
            .handle_pointer(PointerEvent::Tap { position: alpha })
            .is_none());
    }

    #[tokio::test]
    async fn test_boundary_error_blocks_rendering() {
        let mut map = InspectionMap::new(EngineConfig::default()).unwrap();
        let err = map
            .load_boundaries_str(r#"{"type":"FeatureCollection","features":[]}"#)
            .unwrap_err();
        assert!(matches!(*err, MapError::BoundaryLoad(_)));

        map.load(ScriptedFetcher::single(vec![record(
            -87.63, 41.88, "2024-01-01", "Pass", "a",
        )]))
        .await;
        assert!(matches!(map.status(), MapStatus::BoundaryError(_)));
        assert!(map.scene().is_empty());
    }
}
