use axum::body::Body;
use rpc_http_gateway::demo::register_demo_services;
use rpc_http_gateway::server::FailureReason;
use rpc_http_gateway::{Metrics, ServiceRegistry};
use std::sync::Arc;
use tokio::time::Duration;

#[tokio::test]
async fn test_metrics_recording() {
    let metrics = Metrics::new();

    metrics.record_request();
    metrics.record_request();
    metrics.record_success();

    let snapshot = metrics.snapshot().await;
    assert_eq!(snapshot.total_requests, 2);
    assert_eq!(snapshot.total_success, 1);
    assert_eq!(snapshot.total_errors, 0);
}

#[tokio::test]
async fn test_duration_recording() {
    let metrics = Metrics::new();

    metrics.record_duration(Duration::from_millis(100)).await;

    let snapshot = metrics.snapshot().await;
    assert_eq!(snapshot.avg_duration_us, 100_000);
}

#[tokio::test]
async fn test_dispatched_requests_are_traced() {
    let metrics = Arc::new(Metrics::new());
    let registry = ServiceRegistry::new().with_metrics(metrics.clone());
    register_demo_services(&registry).await.unwrap();

    registry.handle("/Echo/Say", Body::from(r#"{"msg":"hi"}"#)).await;
    registry.handle("/Echo/Say", Body::from(r#"{"msg":}"#)).await;
    registry.handle("/Greeter/Hello", Body::empty()).await;
    // unrouted requests never reach a traced route
    registry.handle("/Echo/Shout", Body::empty()).await;

    let snapshot = metrics.snapshot().await;
    assert_eq!(snapshot.total_requests, 3);
    assert_eq!(snapshot.total_success, 2);
    assert_eq!(snapshot.total_errors, 1);
    assert_eq!(snapshot.route_counts.get("/Echo/Say"), Some(&2));
    assert_eq!(snapshot.route_counts.get("/Greeter/Hello"), Some(&1));
    assert_eq!(snapshot.route_counts.get("/Echo/Shout"), None);
}

#[tokio::test]
async fn test_traced_failure_keeps_its_reason() {
    let metrics = Arc::new(Metrics::new());
    let registry = ServiceRegistry::new().with_metrics(metrics.clone());
    register_demo_services(&registry).await.unwrap();

    let response = registry
        .handle("/Greeter/Hello", Body::from(r#"{"name":""}"#))
        .await;
    let reason = response.extensions().get::<FailureReason>().unwrap();
    assert_eq!(reason.0, "name must not be empty");

    let snapshot = metrics.snapshot().await;
    assert_eq!(snapshot.total_errors, 1);
    assert_eq!(snapshot.route_counts.get("/Greeter/Hello"), Some(&1));
}
