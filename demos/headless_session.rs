//! Streams inspections from a live backend into a headless map and prints
//! what each redraw produced.
//!
//! ```text
//! cargo run --example headless_session -- [config.json]
//! ```
//!
//! `INSPECTMAP_BOUNDARIES` and `INSPECTMAP_AGGREGATES` may point at the
//! boundary document and the pre-aggregated totals.

use anyhow::Context;
use inspectmap::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    inspectmap::init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(&path).with_context(|| format!("reading {path}"))?,
        None => EngineConfig::default(),
    };

    println!("Inspection map headless session");
    println!("===============================");
    println!("   Endpoint: {}", config.stream.endpoint);
    println!(
        "   Viewport: {}x{} at scale {}",
        config.projection.viewport.0, config.projection.viewport.1, config.projection.scale
    );

    let mut map = InspectionMap::new(config.clone())?;
    let changes = map.subscribe();

    if let Ok(url) = std::env::var("INSPECTMAP_BOUNDARIES") {
        match fetch_boundaries(&url, &config.boundary).await {
            Ok(set) => {
                let regions = map.set_boundaries(set);
                println!("   Boundaries: {regions} regions");
            }
            Err(e) => {
                map.fail_boundaries(std::sync::Arc::new(e));
                println!("   Boundaries failed: {:?}", map.status());
            }
        }
    }

    if let Ok(url) = std::env::var("INSPECTMAP_AGGREGATES") {
        let aggregates = fetch_aggregates(&url).await?;
        println!("   Aggregates: {} regions", aggregates.regions.len());
        map.set_aggregates(aggregates);
    }

    let fetcher = HttpPageFetcher::new(&config.stream)?;
    let load = map.start_background(fetcher);
    println!("\nLoading (session {})", load.session().value());

    loop {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let finished = load.is_finished();
        map.pump(&load);

        for change in changes.try_iter() {
            if let ChangeKind::NewBatch { added, .. } = change.kind {
                let summary = map.stream_summary();
                let progress = summary
                    .and_then(|s| s.progress.percent())
                    .map_or_else(|| "?".to_string(), |p| format!("{p:.0}%"));
                let eta = summary
                    .and_then(|s| s.eta)
                    .map_or_else(|| "?".to_string(), |d| format!("{:.1}s", d.as_secs_f64()));
                println!(
                    "   +{added} points, {} markers drawn, {progress} loaded, eta {eta}",
                    change.scene.markers().len()
                );
            }
        }

        if finished {
            break;
        }
    }

    println!("\nFinished with status {:?}", map.status());
    if let Some(counts) = map.region_counts() {
        let mut busiest: Vec<(&str, u64)> = counts.iter().collect();
        busiest.sort_by(|a, b| b.1.cmp(&a.1));
        for (region, total) in busiest.into_iter().take(5) {
            println!("   {region}: {total} inspections");
        }
        println!("   Unassigned: {}", counts.unassigned());
    }

    map.set_mode(AggregationMode::KernelDensity);
    if let Some(density) = map.scene().density() {
        println!(
            "\nDensity surface: {}x{} cells, {} painted, {} isolines",
            density.cols,
            density.rows,
            density.painted_cells(),
            density.isolines.len()
        );
    }

    Ok(())
}
