use crate::server::ServiceRegistry;
use crate::transport::shutdown::shutdown_signal;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Serves a [`ServiceRegistry`] over HTTP.
///
/// ```rust,ignore
/// let registry = ServiceRegistry::new();
/// registry.register_service(&echo_service_desc(), Arc::new(EchoServer) as Arc<dyn Echo>).await?;
///
/// HttpTransport::new(registry).serve("127.0.0.1:3000").await?;
/// ```
pub struct HttpTransport {
    registry: ServiceRegistry,
}

impl HttpTransport {
    pub fn new(registry: ServiceRegistry) -> Self {
        Self { registry }
    }

    /// Create the axum router
    pub fn router(self) -> Router {
        self.registry
            .into_router()
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until SIGINT or SIGTERM
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        self.serve_with_shutdown(addr, shutdown_signal()).await
    }

    pub async fn serve_with_shutdown<F>(self, addr: &str, signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener, signal).await
    }

    /// Serve on an already bound listener, stopping gracefully once `signal`
    /// completes.
    pub async fn serve_listener<F>(self, listener: TcpListener, signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("HTTP gateway listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await?;
        Ok(())
    }
}
