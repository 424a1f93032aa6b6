//! Integration test verifying that engine operations produce spans named
//! after the operation, with store primitive spans nested beneath them.

#![allow(clippy::expect_used, clippy::panic)]

use std::sync::{Arc, Mutex};

use socialgraph::{Identity, Page, Relation, RelationshipEngine};
use socialgraph_store::{HealthProbe, MemoryStore};
use tracing::{
    Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

// ---------------------------------------------------------------------------
// Collecting layer: records span names and their parents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct RecordedSpan {
    name: String,
    parent: Option<String>,
    fields: Vec<(String, String)>,
}

#[derive(Default)]
struct FieldVisitor(Vec<(String, String)>);

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_owned(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.push((field.name().to_owned(), value.to_owned()));
    }
}

#[derive(Clone, Default)]
struct SpanCollector {
    spans: Arc<Mutex<Vec<RecordedSpan>>>,
}

impl<S> tracing_subscriber::Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            let mut visitor = FieldVisitor::default();
            attrs.record(&mut visitor);
            self.spans.lock().expect("lock poisoned").push(RecordedSpan {
                name: span.name().to_owned(),
                parent: span.parent().map(|p| p.name().to_owned()),
                fields: visitor.0,
            });
        }
    }
}

fn collect() -> (SpanCollector, Arc<Mutex<Vec<RecordedSpan>>>) {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);
    (collector, spans)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn follow_span_records_identities() {
    let (collector, spans) = collect();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(collector));

    let engine = RelationshipEngine::new(MemoryStore::new());
    engine.follow(&Identity::from(1_u64), &Identity::from(11_u64)).await.expect("follow");

    let recorded = spans.lock().expect("lock poisoned");
    let follow = recorded
        .iter()
        .find(|s| s.name == "follow")
        .unwrap_or_else(|| panic!("expected a 'follow' span, got: {recorded:?}"));
    assert!(follow.fields.contains(&("actor".to_owned(), "1".to_owned())), "{follow:?}");
    assert!(follow.fields.contains(&("target".to_owned(), "11".to_owned())), "{follow:?}");
}

#[tokio::test]
async fn store_spans_nest_under_engine_spans() {
    let (collector, spans) = collect();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(collector));

    let engine = RelationshipEngine::new(MemoryStore::new());
    engine.following_count(&Identity::from(1_u64)).await.expect("count");

    let recorded = spans.lock().expect("lock poisoned");
    let cardinality = recorded
        .iter()
        .find(|s| s.name == "cardinality")
        .unwrap_or_else(|| panic!("expected a 'cardinality' span, got: {recorded:?}"));
    assert_eq!(cardinality.parent.as_deref(), Some("count"));
}

#[tokio::test]
async fn all_operations_produce_spans() {
    let (collector, spans) = collect();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(collector));

    let engine = RelationshipEngine::new(MemoryStore::new());
    let (a, b) = (Identity::from("a"), Identity::from("b"));

    engine.follow(&a, &b).await.expect("follow");
    engine.unfollow(&a, &b).await.expect("unfollow");
    engine.block(&a, &b).await.expect("block");
    engine.unblock(&a, &b).await.expect("unblock");
    engine.is_following(&a, &b).await.expect("is_following");
    engine.followers(&a, Page::first()).await.expect("followers");
    engine.all(Relation::Blocked, &a).await.expect("all");
    engine.reciprocated_page_count(&a, None).await.expect("page count");
    engine.clear(&a).await.expect("clear");
    engine.health_check(HealthProbe::Liveness).await.expect("health");

    let recorded = spans.lock().expect("lock poisoned");
    let names: Vec<&str> = recorded.iter().map(|s| s.name.as_str()).collect();
    for expected in [
        "follow",
        "unfollow",
        "block",
        "unblock",
        "contains",
        "members",
        "all",
        "count",
        "clear",
        "health_check",
        "pipeline",
    ] {
        assert!(names.contains(&expected), "expected a '{expected}' span, got: {names:?}");
    }
}
