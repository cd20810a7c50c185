mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Collects the `request_id` field of every `http_request` span
#[derive(Clone, Default)]
struct RequestSpans(Arc<Mutex<Vec<String>>>);

struct RequestIdVisitor(Option<String>);

impl Visit for RequestIdVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "request_id" {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for RequestSpans {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        if attrs.metadata().name() != "http_request" {
            return;
        }
        let mut visitor = RequestIdVisitor(None);
        attrs.record(&mut visitor);
        if let Some(id) = visitor.0 {
            self.0.lock().unwrap().push(id);
        }
    }
}

#[tokio::test]
async fn test_request_span_carries_assigned_and_supplied_ids() {
    let spans = RequestSpans::default();
    let subscriber = tracing_subscriber::registry().with(spans.clone());
    // Current-thread runtime, so the whole request runs under this subscriber
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = spawn_app("Correct version:\nHe goes to school every day.");

    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let assigned = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_ne!(assigned, "unknown");

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "client-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers()["x-request-id"], "client-abc-123");

    let recorded = spans.0.lock().unwrap().clone();
    assert_eq!(recorded, vec![assigned, "client-abc-123".to_string()]);
}
