use crate::rpc::{MethodError, ServiceDesc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelloRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelloReply {
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountRequest {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountReply {
    pub greeted: u64,
}

#[async_trait]
pub trait Greeter: Send + Sync + 'static {
    async fn hello(&self, request: HelloRequest) -> Result<HelloReply, MethodError>;
    async fn count(&self, request: CountRequest) -> Result<CountReply, MethodError>;
}

pub fn greeter_service_desc() -> ServiceDesc<dyn Greeter> {
    ServiceDesc::new("Greeter")
        .method(crate::unary_method!(dyn Greeter, "Hello", HelloRequest, hello))
        .method(crate::unary_method!(dyn Greeter, "Count", CountRequest, count))
}

/// Greets callers by name and counts successful greetings.
#[derive(Debug, Default)]
pub struct GreeterServer {
    greeted: AtomicU64,
}

#[async_trait]
impl Greeter for GreeterServer {
    async fn hello(&self, request: HelloRequest) -> Result<HelloReply, MethodError> {
        let name = match request.name {
            Some(name) if name.trim().is_empty() => return Err("name must not be empty".into()),
            Some(name) => name,
            None => "world".to_string(),
        };
        self.greeted.fetch_add(1, Ordering::Relaxed);
        Ok(HelloReply {
            message: format!("Hello, {}!", name),
        })
    }

    async fn count(&self, _request: CountRequest) -> Result<CountReply, MethodError> {
        Ok(CountReply {
            greeted: self.greeted.load(Ordering::Relaxed),
        })
    }
}
