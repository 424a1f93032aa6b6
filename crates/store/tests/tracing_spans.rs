//! Integration test verifying that `#[instrument]` annotations produce
//! the expected spans on `MemoryStore` operations.

#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use socialgraph_store::{HealthProbe, MemoryStore, RangeOrder, SortedSetStore};
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

// ---------------------------------------------------------------------------
// Collecting layer: records span names as they are created
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct SpanCollector {
    spans: Arc<Mutex<Vec<String>>>,
}

impl<S> tracing_subscriber::Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            self.spans.lock().expect("lock poisoned").push(span.name().to_owned());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn memory_store_add_creates_span() {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);

    let subscriber = tracing_subscriber::registry().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = MemoryStore::new();
    store.add(b"following:1", b"2".to_vec(), 1.0).await.expect("add should succeed");

    let recorded = spans.lock().expect("lock poisoned");
    assert!(recorded.iter().any(|s| s == "add"), "expected an 'add' span, got: {recorded:?}");
}

#[tokio::test]
async fn memory_store_health_check_creates_span() {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);

    let subscriber = tracing_subscriber::registry().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = MemoryStore::new();
    let _ = store.health_check(HealthProbe::Readiness).await;

    let recorded = spans.lock().expect("lock poisoned");
    assert!(
        recorded.iter().any(|s| s == "health_check"),
        "expected a 'health_check' span, got: {recorded:?}"
    );
}

#[tokio::test]
async fn all_primitives_produce_distinct_spans() {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);

    let subscriber = tracing_subscriber::registry().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = MemoryStore::new();

    store.add(b"k", b"m".to_vec(), 1.0).await.expect("add");
    let _ = store.score(b"k", b"m").await;
    let _ = store.cardinality(b"k").await;
    let _ = store.range_with_scores(b"k", 0..=9, RangeOrder::Descending).await;
    store.remove(b"k", b"m").await.expect("remove");
    store.delete(b"k").await.expect("delete");
    let _ = store.pipeline().await;
    let _ = store.health_check(HealthProbe::Liveness).await;

    let recorded = spans.lock().expect("lock poisoned");
    let expected = [
        "add",
        "score",
        "cardinality",
        "range_with_scores",
        "remove",
        "delete",
        "pipeline",
        "health_check",
    ];

    for name in &expected {
        assert!(
            recorded.iter().any(|s| s == name),
            "missing span '{name}', recorded: {recorded:?}"
        );
    }
}
