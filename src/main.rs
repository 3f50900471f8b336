//! Demo application for folder metrics.
//!
//! Builds a small collection view for the given folder, fetches its metrics
//! from a running console and prints the augmented rows or cards.
//!
//! ```text
//! folder-metrics <collection-path> [list|card] [child-path ...]
//! ```
//!
//! Child paths whose last segment has an extension are shown as files, the
//! rest as folders. The console is read from `FOLDER_METRICS_BASE_URL`
//! (default `http://localhost:4502`).

use anyhow::{bail, Context, Result};
use folder_metrics::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BASE_URL: &str = "http://localhost:4502";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("folder_metrics=debug".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(collection_path) = args.next() else {
        bail!("usage: folder-metrics <collection-path> [list|card] [child-path ...]");
    };
    let layout: LayoutMode = match args.next() {
        Some(layout) => layout
            .parse()
            .map_err(|l| anyhow::anyhow!("unknown layout {l:?}, expected list or card"))?,
        None => LayoutMode::List,
    };
    let children: Vec<String> = args.collect();

    let base_url =
        std::env::var("FOLDER_METRICS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let mut config = FetcherConfig::new(&base_url).max_retries(1);
    if let Ok(secs) = std::env::var("FOLDER_METRICS_TIMEOUT_SECS") {
        let secs: u64 = secs
            .parse()
            .context("FOLDER_METRICS_TIMEOUT_SECS must be a whole number of seconds")?;
        config = config.timeout(Duration::from_secs(secs));
    }

    println!("=== Folder Metrics Demo ===\n");
    println!("Console:    {}", base_url);
    println!("Collection: {} ({} layout)\n", collection_path, layout);

    let view = Arc::new(RwLock::new(demo_view(layout, &children)));
    let fetcher = HttpMetricsFetcher::new(config)?;

    let pipeline = MetricsPipelineBuilder::new(Arc::clone(&view), Arc::new(fetcher))
        .on_fetch_failed(Box::new(|path: &str, e: &FetchError| {
            eprintln!("[telemetry] metrics unavailable for {}: {}", path, e);
        }))
        .build();

    // The first page load only reports the root; let the debouncer pick the
    // collection out of it.
    let mut debouncer = InitDebouncer::new(InitState::AwaitingFirstLoad);
    let root = RootContainer {
        child_collection: Some(CollectionContainer::new(collection_path, layout)),
    };
    let Some(trigger) = debouncer.observe(&root) else {
        bail!("no collection container on the page");
    };

    match pipeline.handle_trigger(&trigger).await {
        PassOutcome::Rendered(summary) => {
            println!(
                "Rendered {} items ({} with metrics)\n",
                summary.items(),
                summary.augmented
            );
        }
        PassOutcome::Skipped(reason) => println!("Nothing to do: {:?}\n", reason),
        PassOutcome::Stale { generation } => println!("Pass {} superseded\n", generation),
        PassOutcome::Failed(_) => println!("Metrics fetch failed, view left unchanged\n"),
    }

    print_view(&*view.read().await);

    Ok(())
}

fn demo_view(layout: LayoutMode, children: &[String]) -> CollectionView {
    let kind_of = |path: &str| {
        let name = path.rsplit('/').next().unwrap_or(path);
        if name.contains('.') {
            ItemKind::File
        } else {
            ItemKind::Directory
        }
    };

    match layout {
        LayoutMode::Card => CollectionView::new(
            Vec::new(),
            children
                .iter()
                .map(|path| {
                    let title = path.rsplit('/').next().unwrap_or(path);
                    ItemDescriptor::card(path.as_str(), kind_of(path), title)
                })
                .collect(),
        ),
        _ => CollectionView::new(
            vec![
                HeaderColumn::new("title"),
                HeaderColumn::new(METRICS_COLUMN),
                HeaderColumn::new("reorder"),
            ],
            children
                .iter()
                .map(|path| {
                    ItemDescriptor::list_row(
                        path.as_str(),
                        kind_of(path),
                        vec![TableCell::text(path.as_str()), TableCell::drag_handle(true)],
                    )
                })
                .collect(),
        ),
    }
}

fn print_view(view: &CollectionView) {
    if !view.header().is_empty() {
        let names: Vec<_> = view.header().iter().map(|c| c.name.as_str()).collect();
        println!("| {} |", names.join(" | "));
    }

    for item in view.items() {
        match &item.card {
            Some(card) => println!("[card] {}", card.title.as_deref().unwrap_or("")),
            None => println!("| {} |", item.cell_texts().join(" | ")),
        }
    }
}
