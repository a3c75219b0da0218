use crate::server::dispatch::{FailureReason, MethodRoute};
use axum::body::Body;
use axum::response::Response;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// In-process counters for dispatched requests
#[derive(Debug, Default)]
pub struct Metrics {
    total_requests: AtomicU64,
    total_success: AtomicU64,
    total_errors: AtomicU64,
    /// Moving average of request duration in microseconds
    avg_duration_us: RwLock<u64>,
    /// Requests per route path
    route_counts: RwLock<HashMap<String, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.total_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn record_duration(&self, duration: Duration) {
        let mut avg = self.avg_duration_us.write().await;
        let sample = duration.as_micros() as u64;

        *avg = if *avg == 0 {
            sample
        } else {
            (*avg * 9 + sample) / 10
        };
    }

    pub async fn record_route(&self, path: &str) {
        let mut counts = self.route_counts.write().await;
        *counts.entry(path.to_string()).or_insert(0) += 1;
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_success: self.total_success.load(Ordering::Relaxed),
            total_errors: self.total_errors.load(Ordering::Relaxed),
            avg_duration_us: *self.avg_duration_us.read().await,
            route_counts: self.route_counts.read().await.clone(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_success: u64,
    pub total_errors: u64,
    pub avg_duration_us: u64,
    pub route_counts: HashMap<String, u64>,
}

/// Times one dispatched request and records its outcome
pub struct RequestTracer {
    path: String,
    start: Instant,
    metrics: Arc<Metrics>,
}

impl RequestTracer {
    pub fn new(path: impl Into<String>, metrics: Arc<Metrics>) -> Self {
        let path = path.into();
        debug!("RPC server call: {}", path);
        metrics.record_request();

        Self {
            path,
            start: Instant::now(),
            metrics,
        }
    }

    pub async fn success(self) {
        let duration = self.start.elapsed();
        info!("Request completed: {} ({}ms)", self.path, duration.as_millis());

        self.metrics.record_success();
        self.finish(duration).await;
    }

    pub async fn error(self, reason: &str) {
        let duration = self.start.elapsed();
        warn!(
            "Request failed: {} - {} ({}ms)",
            self.path,
            reason,
            duration.as_millis()
        );

        self.metrics.record_error();
        self.finish(duration).await;
    }

    async fn finish(self, duration: Duration) {
        self.metrics.record_duration(duration).await;
        self.metrics.record_route(&self.path).await;
    }
}

/// Wrap an installed route so every call through it is traced.
pub fn traced_route(path: String, route: MethodRoute, metrics: Arc<Metrics>) -> MethodRoute {
    Arc::new(move |body: Body| -> BoxFuture<'static, Response> {
        let tracer = RequestTracer::new(path.clone(), metrics.clone());
        let call = route(body);
        Box::pin(async move {
            let response = call.await;
            let status = response.status();
            if status.is_success() {
                tracer.success().await;
            } else {
                let reason = match response.extensions().get::<FailureReason>() {
                    Some(FailureReason(reason)) => reason.clone(),
                    None => status.as_str().to_string(),
                };
                tracer.error(&reason).await;
            }
            response
        })
    })
}

/// Initialize logging with tracing
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rpc_http_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub fn log_startup(addr: &str, services: &[String]) {
    info!("╔══════════════════════════════════════╗");
    info!("║      RPC HTTP Gateway Started        ║");
    info!("╚══════════════════════════════════════╝");
    info!("Address: {}", addr);
    info!("Services: {}", services.join(", "));
    info!("Ready to accept connections");
}

pub fn log_shutdown() {
    info!("╔══════════════════════════════════════╗");
    info!("║    RPC HTTP Gateway Shutting Down    ║");
    info!("╚══════════════════════════════════════╝");
}

/// Periodically log a metrics snapshot until the task is aborted.
pub async fn report_periodically(metrics: Arc<Metrics>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // first tick fires immediately
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let snapshot = metrics.snapshot().await;
        info!("Metrics Report");
        info!("Total Requests: {}", snapshot.total_requests);
        info!("Successful: {}", snapshot.total_success);
        info!("Errors: {}", snapshot.total_errors);
        info!("Avg Duration: {}μs", snapshot.avg_duration_us);
        info!("Route Counts: {:?}", snapshot.route_counts);
    }
}
