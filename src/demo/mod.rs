//! Example services, written the way generated service code looks.

pub mod echo;
pub mod greeter;

pub use echo::{Echo, EchoServer, SayReply, SayRequest, echo_service_desc};
pub use greeter::{
    CountReply, CountRequest, Greeter, GreeterServer, HelloReply, HelloRequest,
    greeter_service_desc,
};

use crate::rpc::GatewayError;
use crate::server::ServiceRegistry;
use std::sync::Arc;

/// Register every demo service with `registry`.
pub async fn register_demo_services(registry: &ServiceRegistry) -> Result<(), GatewayError> {
    let echo: Arc<dyn Echo> = Arc::new(EchoServer);
    registry.register_service(&echo_service_desc(), echo).await?;

    let greeter: Arc<dyn Greeter> = Arc::new(GreeterServer::default());
    registry.register_service(&greeter_service_desc(), greeter).await?;

    Ok(())
}
