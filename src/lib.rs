// Service descriptors, invocation contract and errors
pub mod rpc;

// Service registry and per-method dispatch
pub mod server;

// HTTP serving and shutdown
pub mod transport;

// Command-line configuration
pub mod config;

// Example services
pub mod demo;

// Macros
pub mod macros;

pub use config::GatewayConfig;
pub use rpc::{GatewayError, JsonDecoder, MethodDesc, MethodError, Reply, ServiceDesc};
pub use server::{Metrics, RegistryOptions, ServiceRegistry};
pub use transport::HttpTransport;
