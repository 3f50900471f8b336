//! The fetch and render pipeline.
//!
//! `MetricsPipeline` takes a canonical trigger through the gate, fetches the
//! metrics index and hands it to the layout dispatcher. Overlapping triggers
//! are not cancelled; each pass is stamped with a generation and a pass that
//! resolves after a newer generation was rendered is discarded. A newer pass
//! that fails or is still fetching does not hold back an older one.

use crate::folder_metrics::debounce::InitDebouncer;
use crate::folder_metrics::events::{CollectionContainer, EventBus, LifecycleEvent};
use crate::folder_metrics::fetcher::{FetchError, MetricsSource};
use crate::folder_metrics::gate::{FeatureGate, SkipReason};
use crate::ui::{CollectionView, LayoutDispatcher, RenderSummary};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Callback invoked with the collection path and error of a failed fetch.
pub type FailureCallback = Box<dyn Fn(&str, &FetchError) + Send + Sync>;

/// Result of one trigger.
#[derive(Debug)]
pub enum PassOutcome {
    /// The gate declined the trigger. Nothing was fetched or changed.
    Skipped(SkipReason),
    /// The view was augmented.
    Rendered(RenderSummary),
    /// A newer pass was rendered while this one was fetching.
    Stale {
        /// Generation of the discarded pass.
        generation: u64,
    },
    /// The fetch failed. The view was not changed.
    Failed(FetchError),
}

/// Gate, fetch and render for one collection view.
#[derive(Clone)]
pub struct MetricsPipeline {
    view: Arc<RwLock<CollectionView>>,
    source: Arc<dyn MetricsSource>,
    generation: Arc<AtomicU64>,
    /// Generation of the last rendered pass. Written under the view lock.
    rendered: Arc<AtomicU64>,
    on_failure: Option<Arc<FailureCallback>>,
}

impl MetricsPipeline {
    /// Pipeline rendering into `view` with metrics from `source`.
    pub fn new(view: Arc<RwLock<CollectionView>>, source: Arc<dyn MetricsSource>) -> Self {
        Self {
            view,
            source,
            generation: Arc::new(AtomicU64::new(0)),
            rendered: Arc::new(AtomicU64::new(0)),
            on_failure: None,
        }
    }

    /// Shared handle to the view this pipeline renders into.
    pub fn view(&self) -> Arc<RwLock<CollectionView>> {
        Arc::clone(&self.view)
    }

    /// Generation of the most recently accepted trigger.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Generation of the most recently rendered pass, 0 if none.
    pub fn rendered_generation(&self) -> u64 {
        self.rendered.load(Ordering::SeqCst)
    }

    /// Set the telemetry hook for failed fetches.
    pub fn set_failure_callback(&mut self, cb: FailureCallback) {
        self.on_failure = Some(Arc::new(cb));
    }

    /// Run one canonical trigger to completion.
    pub async fn handle_trigger(&self, trigger: &CollectionContainer) -> PassOutcome {
        let pass = {
            let view = self.view.read().await;
            match FeatureGate::evaluate(&view, trigger) {
                Ok(pass) => pass,
                Err(reason) => {
                    tracing::debug!("Metrics pass skipped: {:?}", reason);
                    return PassOutcome::Skipped(reason);
                }
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let index = match self.source.fetch(&pass.collection_path).await {
            Ok(index) => index,
            Err(e) => {
                tracing::error!(
                    "Failed to fetch metrics for {}: {}",
                    pass.collection_path,
                    e
                );
                if let Some(ref cb) = self.on_failure {
                    cb(&pass.collection_path, &e);
                }
                return PassOutcome::Failed(e);
            }
        };

        // The whole pass is applied under one write lock.
        let mut view = self.view.write().await;

        let rendered = self.rendered.load(Ordering::SeqCst);
        if rendered > generation {
            tracing::debug!(
                "Discarding metrics for {} from generation {} (rendered {})",
                pass.collection_path,
                generation,
                rendered
            );
            return PassOutcome::Stale { generation };
        }

        let summary = LayoutDispatcher::dispatch(pass.mode, &index, &mut view);
        self.rendered.store(generation, Ordering::SeqCst);

        PassOutcome::Rendered(summary)
    }

    /// Start listening for lifecycle events on `bus`.
    ///
    /// Early events go through `debouncer`; a synthesized trigger is published
    /// back on the bus so both trigger paths share the same handling below.
    pub fn spawn_listener(&self, bus: &EventBus, debouncer: InitDebouncer) -> MetricsListener {
        let pipeline = self.clone();
        let bus = bus.clone();
        let rx = bus.subscribe();

        let handle = tokio::spawn(async move {
            Self::listener_loop(pipeline, bus, rx, debouncer).await;
        });

        MetricsListener {
            handle: Some(handle),
        }
    }

    async fn listener_loop(
        pipeline: MetricsPipeline,
        bus: EventBus,
        mut rx: broadcast::Receiver<LifecycleEvent>,
        mut debouncer: InitDebouncer,
    ) {
        loop {
            match rx.recv().await {
                Ok(LifecycleEvent::EarlyContentLoaded(root)) => {
                    if let Some(container) = debouncer.observe(&root) {
                        bus.publish(LifecycleEvent::ContentLoaded(container));
                    }
                }
                Ok(LifecycleEvent::ContentLoaded(container)) => {
                    let pipeline = pipeline.clone();
                    // Passes run concurrently; the generation check orders them.
                    tokio::spawn(async move {
                        pipeline.handle_trigger(&container).await;
                    });
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    tracing::warn!("Metrics listener lagged behind by {} events", count);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Lifecycle event channel closed, stopping listener");
                    break;
                }
            }
        }
    }
}

/// Handle to a running lifecycle listener.
pub struct MetricsListener {
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MetricsListener {
    /// Stop the listener task.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Check if the listener is running.
    pub fn is_listening(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

/// Builder for MetricsPipeline.
pub struct MetricsPipelineBuilder {
    view: Arc<RwLock<CollectionView>>,
    source: Arc<dyn MetricsSource>,
    on_failure: Option<FailureCallback>,
}

impl MetricsPipelineBuilder {
    /// Start a builder for `view` fed by `source`.
    pub fn new(view: Arc<RwLock<CollectionView>>, source: Arc<dyn MetricsSource>) -> Self {
        Self {
            view,
            source,
            on_failure: None,
        }
    }

    /// Set the callback for failed fetches.
    pub fn on_fetch_failed(mut self, cb: FailureCallback) -> Self {
        self.on_failure = Some(cb);
        self
    }

    /// Build the MetricsPipeline.
    pub fn build(self) -> MetricsPipeline {
        let mut pipeline = MetricsPipeline::new(self.view, self.source);

        if let Some(cb) = self.on_failure {
            pipeline.set_failure_callback(cb);
        }

        pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folder_metrics::events::{LayoutMode, RootContainer};
    use crate::folder_metrics::record::{IndexError, MetricsIndex, MetricsRecord};
    use crate::ui::{HeaderColumn, ItemDescriptor, ItemKind, TableCell, METRICS_COLUMN};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    const ROOT: &str = "/content/dam/projects";
    const PHOTOS: &str = "/content/dam/projects/photos";
    const VIDEOS: &str = "/content/dam/projects/videos";

    /// Source serving a fixed index and counting requests.
    struct FixedSource {
        index: MetricsIndex,
        calls: AtomicUsize,
        paths: Mutex<Vec<String>>,
    }

    impl FixedSource {
        fn new(index: MetricsIndex) -> Arc<Self> {
            Arc::new(Self {
                index,
                calls: AtomicUsize::new(0),
                paths: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetricsSource for FixedSource {
        async fn fetch(&self, collection_path: &str) -> Result<MetricsIndex, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.paths.lock().unwrap().push(collection_path.to_string());
            Ok(self.index.clone())
        }
    }

    /// Source that always fails to parse.
    struct BrokenSource;

    #[async_trait]
    impl MetricsSource for BrokenSource {
        async fn fetch(&self, collection_path: &str) -> Result<MetricsIndex, FetchError> {
            Err(FetchError::Parse {
                url: format!("{}.size.json", collection_path),
                source: IndexError::NotAnObject,
            })
        }
    }

    /// Source whose first request waits until released. Later requests
    /// answer at once, failing when `second` is `None`.
    struct GatedSource {
        first: MetricsIndex,
        second: Option<MetricsIndex>,
        calls: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl MetricsSource for GatedSource {
        async fn fetch(&self, collection_path: &str) -> Result<MetricsIndex, FetchError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.release.notified().await;
                return Ok(self.first.clone());
            }
            self.second.clone().ok_or_else(|| FetchError::Parse {
                url: format!("{}.size.json", collection_path),
                source: IndexError::NotAnObject,
            })
        }
    }

    fn index(total: u64, counted: u64, size: &str) -> MetricsIndex {
        let mut index = MetricsIndex::new();
        index.insert(PHOTOS, MetricsRecord::new(total, counted, size).unwrap());
        index
    }

    fn list_view() -> Arc<RwLock<CollectionView>> {
        let row = |path: &str, kind| {
            ItemDescriptor::list_row(
                path,
                kind,
                vec![TableCell::text(path), TableCell::drag_handle(false)],
            )
        };
        Arc::new(RwLock::new(CollectionView::new(
            vec![
                HeaderColumn::new("title"),
                HeaderColumn::new(METRICS_COLUMN),
                HeaderColumn::new("reorder"),
            ],
            vec![
                row(PHOTOS, ItemKind::Directory),
                row("/content/dam/projects/cover.jpg", ItemKind::File),
            ],
        )))
    }

    fn card_view() -> Arc<RwLock<CollectionView>> {
        Arc::new(RwLock::new(CollectionView::new(
            Vec::new(),
            vec![
                ItemDescriptor::card(PHOTOS, ItemKind::Directory, "Photos"),
                ItemDescriptor::card(VIDEOS, ItemKind::File, "intro.mp4"),
            ],
        )))
    }

    #[tokio::test]
    async fn test_list_end_to_end() {
        let source = FixedSource::new(index(10, 10, "10485760"));
        let pipeline = MetricsPipelineBuilder::new(list_view(), source.clone()).build();

        let outcome = pipeline
            .handle_trigger(&CollectionContainer::new(ROOT, LayoutMode::List))
            .await;

        assert!(matches!(outcome, PassOutcome::Rendered(ref s) if s.augmented == 1));
        assert_eq!(source.paths.lock().unwrap().as_slice(), [ROOT.to_string()]);

        let view = pipeline.view();
        let view = view.read().await;
        assert_eq!(view.items()[0].cells[1].text, "Total Count: 10, Size: 10.00 MB");
        assert_eq!(view.items()[1].cells[1], TableCell::default());
    }

    #[tokio::test]
    async fn test_card_end_to_end() {
        let source = FixedSource::new(index(3, 1, "1048576"));
        let pipeline = MetricsPipeline::new(card_view(), source);

        pipeline
            .handle_trigger(&CollectionContainer::new(ROOT, LayoutMode::Card))
            .await;

        let view = pipeline.view();
        let view = view.read().await;
        let titles: Vec<_> = view
            .items()
            .iter()
            .map(|item| item.card.as_ref().unwrap().title.clone().unwrap())
            .collect();
        assert_eq!(titles, vec!["Photos - Assets: 3, ~1.00 MB", "intro.mp4"]);
    }

    #[tokio::test]
    async fn test_column_layout_never_fetches_or_mutates() {
        let source = FixedSource::new(index(10, 10, "10485760"));
        let view = list_view();
        let before = view.read().await.clone();
        let pipeline = MetricsPipeline::new(Arc::clone(&view), source.clone());

        let outcome = pipeline
            .handle_trigger(&CollectionContainer::new(ROOT, LayoutMode::Column))
            .await;

        assert!(matches!(outcome, PassOutcome::Skipped(SkipReason::ColumnLayout)));
        assert_eq!(source.calls(), 0);
        assert_eq!(pipeline.generation(), 0);
        assert_eq!(*view.read().await, before);
    }

    #[tokio::test]
    async fn test_gate_is_rechecked_per_trigger() {
        let source = FixedSource::new(index(1, 1, "1"));
        let view = list_view();
        let pipeline = MetricsPipeline::new(Arc::clone(&view), source.clone());
        let trigger = CollectionContainer::new(ROOT, LayoutMode::List);

        view.write().await.set_column_hidden(METRICS_COLUMN, true);
        assert!(matches!(
            pipeline.handle_trigger(&trigger).await,
            PassOutcome::Skipped(SkipReason::MetricsColumnHidden)
        ));

        view.write().await.set_column_hidden(METRICS_COLUMN, false);
        assert!(matches!(
            pipeline.handle_trigger(&trigger).await,
            PassOutcome::Rendered(_)
        ));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported_and_view_untouched() {
        let view = list_view();
        let before = view.read().await.clone();
        let failures = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&failures);

        let pipeline = MetricsPipelineBuilder::new(Arc::clone(&view), Arc::new(BrokenSource))
            .on_fetch_failed(Box::new(move |path: &str, e: &FetchError| {
                seen.lock().unwrap().push((path.to_string(), e.to_string()));
            }))
            .build();

        let outcome = pipeline
            .handle_trigger(&CollectionContainer::new(ROOT, LayoutMode::List))
            .await;

        assert!(matches!(outcome, PassOutcome::Failed(FetchError::Parse { .. })));
        assert_eq!(*view.read().await, before);

        let failures = failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, ROOT);
    }

    #[tokio::test]
    async fn test_stale_resolution_is_discarded() {
        let source = Arc::new(GatedSource {
            first: index(1, 1, "1048576"),
            second: Some(index(2, 2, "2097152")),
            calls: AtomicUsize::new(0),
            release: Notify::new(),
        });
        let view = list_view();
        let pipeline = MetricsPipeline::new(Arc::clone(&view), source.clone());
        let trigger = CollectionContainer::new(ROOT, LayoutMode::List);

        let slow = {
            let pipeline = pipeline.clone();
            let trigger = trigger.clone();
            tokio::spawn(async move { pipeline.handle_trigger(&trigger).await })
        };

        // Wait until the first fetch is in flight.
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let fast = pipeline.handle_trigger(&trigger).await;
        assert!(matches!(fast, PassOutcome::Rendered(_)));

        source.release.notify_one();
        let slow = slow.await.unwrap();
        assert!(matches!(slow, PassOutcome::Stale { generation: 1 }));

        let view = view.read().await;
        assert_eq!(view.items()[0].cells.len(), 3);
        assert_eq!(view.items()[0].cells[1].text, "Total Count: 2, Size: 2.00 MB");
    }

    #[tokio::test]
    async fn test_failed_newer_pass_does_not_discard_older() {
        let source = Arc::new(GatedSource {
            first: index(10, 10, "10485760"),
            second: None,
            calls: AtomicUsize::new(0),
            release: Notify::new(),
        });
        let view = list_view();
        let pipeline = MetricsPipeline::new(Arc::clone(&view), source.clone());
        let trigger = CollectionContainer::new(ROOT, LayoutMode::List);

        let slow = {
            let pipeline = pipeline.clone();
            let trigger = trigger.clone();
            tokio::spawn(async move { pipeline.handle_trigger(&trigger).await })
        };

        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let fast = pipeline.handle_trigger(&trigger).await;
        assert!(matches!(fast, PassOutcome::Failed(FetchError::Parse { .. })));

        source.release.notify_one();
        let slow = slow.await.unwrap();
        assert!(matches!(slow, PassOutcome::Rendered(ref s) if s.augmented == 1));
        assert_eq!(pipeline.generation(), 2);
        assert_eq!(pipeline.rendered_generation(), 1);

        let view = view.read().await;
        assert_eq!(
            view.items()[0].cell_texts(),
            vec![PHOTOS, "Total Count: 10, Size: 10.00 MB", ""]
        );
    }

    #[tokio::test]
    async fn test_listener_converges_both_trigger_paths() {
        let source = FixedSource::new(index(10, 10, "10485760"));
        let pipeline = MetricsPipeline::new(card_view(), source.clone());
        let (bus, _rx) = EventBus::new(16);

        let mut listener = pipeline.spawn_listener(&bus, InitDebouncer::default());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(listener.is_listening());

        let root = RootContainer {
            child_collection: Some(CollectionContainer::new(ROOT, LayoutMode::Card)),
        };

        // Empty root first, then the same qualifying root several times.
        bus.publish(LifecycleEvent::EarlyContentLoaded(RootContainer::default()));
        for _ in 0..3 {
            bus.publish(LifecycleEvent::EarlyContentLoaded(root.clone()));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls(), 1);

        // The canonical trigger can still arrive directly.
        bus.publish(LifecycleEvent::ContentLoaded(CollectionContainer::new(
            ROOT,
            LayoutMode::Card,
        )));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls(), 2);

        listener.stop().await;
        assert!(!listener.is_listening());
    }
}
