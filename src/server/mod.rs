pub mod dispatch;
pub mod metrics;
pub mod registry;

pub use dispatch::{DispatchOptions, FailureReason, MethodRoute, build_handler};
pub use metrics::{Metrics, MetricsSnapshot, RequestTracer};
pub use registry::{DEFAULT_MAX_BODY_BYTES, RegistryOptions, ServiceRegistry, route_path};
