use crate::rpc::{GatewayError, MethodDesc, ServiceDesc};
use crate::server::dispatch::{self, DispatchOptions, MethodRoute};
use crate::server::metrics::{self, Metrics};
use axum::Router;
use axum::extract::Request;
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Default request body limit, matching axum's own default.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct RegistryOptions {
    pub max_body_bytes: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// A service bound to its implementation.
struct RegisteredService {
    /// Holds the `Arc<S>` the service was registered with.
    implementation: Box<dyn Any + Send + Sync>,
    methods: HashMap<&'static str, MethodRoute>,
}

#[derive(Default)]
struct RegistryState {
    services: HashMap<String, RegisteredService>,
    /// path -> handler; every entry belongs to exactly one registered method
    routes: HashMap<String, MethodRoute>,
}

/// Holds the registered services and the HTTP routes derived from them.
///
/// Services are registered during startup, then the registry is turned into
/// an axum [`Router`] with [`ServiceRegistry::into_router`]. Since that call
/// consumes the registry, nothing can be registered once serving has begun.
///
/// ```rust,ignore
/// let registry = ServiceRegistry::new();
/// registry.register_service(&echo_service_desc(), Arc::new(EchoServer) as Arc<dyn Echo>).await?;
///
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
/// axum::serve(listener, registry.into_router()).await?;
/// ```
pub struct ServiceRegistry {
    state: Mutex<RegistryState>,
    options: RegistryOptions,
    metrics: Option<Arc<Metrics>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            options,
            metrics: None,
        }
    }

    /// Trace every dispatched request into `metrics`.
    ///
    /// Only routes installed after this call are traced.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Register `implementation` under `desc` and install one route per method.
    ///
    /// Conformance to the descriptor's interface is checked by the compiler:
    /// `implementation` must already be an `Arc<S>`.
    pub async fn register_service<S>(
        &self,
        desc: &ServiceDesc<S>,
        implementation: Arc<S>,
    ) -> Result<(), GatewayError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let mut state = self.state.lock().await;
        self.install(&mut state, desc, implementation)
    }

    /// Register an implementation whose type is only known at runtime.
    ///
    /// The value must be an `Arc<S>` for the descriptor's interface `S`,
    /// otherwise registration fails with
    /// [`GatewayError::InterfaceConformance`] and nothing is installed.
    pub async fn register_dynamic<S>(
        &self,
        desc: &ServiceDesc<S>,
        implementation: Box<dyn Any + Send + Sync>,
    ) -> Result<(), GatewayError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let mut state = self.state.lock().await;
        if state.services.contains_key(desc.service_name) {
            return Err(GatewayError::DuplicateService(desc.service_name.to_string()));
        }

        let implementation = implementation.downcast::<Arc<S>>().map_err(|_| {
            GatewayError::InterfaceConformance {
                service: desc.service_name.to_string(),
                expected: desc.interface_name(),
            }
        })?;

        self.install(&mut state, desc, *implementation)
    }

    /// Validate and install a whole service. Nothing touches `state` until
    /// every check has passed, so a failed call leaves the registry as it was.
    fn install<S>(
        &self,
        state: &mut RegistryState,
        desc: &ServiceDesc<S>,
        implementation: Arc<S>,
    ) -> Result<(), GatewayError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let service_name = desc.service_name;
        if state.services.contains_key(service_name) {
            return Err(GatewayError::DuplicateService(service_name.to_string()));
        }
        validate_segment(service_name)?;

        let mut methods = HashMap::with_capacity(desc.methods.len());
        for method in &desc.methods {
            validate_segment(method.method_name)?;
            if methods.contains_key(method.method_name) {
                return Err(GatewayError::DuplicateMethod {
                    service: service_name.to_string(),
                    method: method.method_name.to_string(),
                });
            }
            let route = self.build_route(implementation.clone(), service_name, method);
            methods.insert(method.method_name, route);
        }

        for method in &desc.methods {
            let path = route_path(service_name, method.method_name);
            info!("Register: {}", path);
            state.routes.insert(path, methods[method.method_name].clone());
        }

        state.services.insert(
            service_name.to_string(),
            RegisteredService {
                implementation: Box::new(implementation),
                methods,
            },
        );

        Ok(())
    }

    fn build_route<S>(
        &self,
        implementation: Arc<S>,
        service_name: &str,
        method: &MethodDesc<S>,
    ) -> MethodRoute
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let options = DispatchOptions {
            max_body_bytes: self.options.max_body_bytes,
        };
        let route = dispatch::build_handler(implementation, method, options);

        match &self.metrics {
            Some(metrics) => metrics::traced_route(
                route_path(service_name, method.method_name),
                route,
                metrics.clone(),
            ),
            None => route,
        }
    }

    /// Route one request by exact path match.
    pub async fn handle(&self, path: &str, body: axum::body::Body) -> Response {
        let route = self.state.lock().await.routes.get(path).cloned();
        match route {
            Some(route) => route(body).await,
            None => GatewayError::RouteNotFound(path.to_string()).into_response(),
        }
    }

    /// Registered service names, sorted.
    pub async fn service_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.lock().await.services.keys().cloned().collect();
        names.sort();
        names
    }

    /// Method names of a registered service, sorted.
    pub async fn method_names(&self, service_name: &str) -> Option<Vec<&'static str>> {
        let state = self.state.lock().await;
        let service = state.services.get(service_name)?;
        let mut names: Vec<_> = service.methods.keys().copied().collect();
        names.sort_unstable();
        Some(names)
    }

    /// The implementation bound to `service_name`, if it was registered
    /// with interface `S`.
    pub async fn implementation<S>(&self, service_name: &str) -> Option<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let state = self.state.lock().await;
        state
            .services
            .get(service_name)?
            .implementation
            .downcast_ref::<Arc<S>>()
            .cloned()
    }

    pub async fn has_route(&self, path: &str) -> bool {
        self.state.lock().await.routes.contains_key(path)
    }

    pub async fn route_count(&self) -> usize {
        self.state.lock().await.routes.len()
    }

    /// Freeze the route table into an axum router.
    ///
    /// Each method path accepts any HTTP method; everything else is a 404.
    pub fn into_router(self) -> Router {
        let state = self.state.into_inner();

        let mut router = Router::new();
        for (path, route) in state.routes {
            router = router.route(
                &path,
                any(move |request: Request| {
                    let route = route.clone();
                    async move { route(request.into_body()).await }
                }),
            );
        }

        router.fallback(route_not_found)
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

async fn route_not_found(uri: Uri) -> Response {
    GatewayError::RouteNotFound(uri.path().to_string()).into_response()
}

pub fn route_path(service_name: &str, method_name: &str) -> String {
    format!("/{}/{}", service_name, method_name)
}

/// Names become literal path segments. The router matches the raw request
/// path, so only characters that never need percent-encoding are allowed.
fn validate_segment(name: &str) -> Result<(), GatewayError> {
    let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-');
    if name.is_empty() || !name.chars().all(unreserved) {
        return Err(GatewayError::InvalidRouteName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_path() {
        assert_eq!(route_path("Echo", "Say"), "/Echo/Say");
        assert_eq!(
            route_path("helloworld.Greeter", "SayHello"),
            "/helloworld.Greeter/SayHello"
        );
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("Echo").is_ok());
        assert!(validate_segment("pkg.v1.Echo").is_ok());
        assert!(validate_segment("").is_err());
        assert!(validate_segment("a/b").is_err());
        assert!(validate_segment(":id").is_err());
        assert!(validate_segment("*rest").is_err());
        assert!(validate_segment("two words").is_err());
        assert!(validate_segment("Écho").is_err());
        assert!(validate_segment("Say?").is_err());
        assert!(validate_segment("a#b").is_err());
        assert!(validate_segment("100%").is_err());
        assert!(validate_segment("v1_echo-svc~2").is_ok());
    }
}
