use crate::rpc::{MethodError, ServiceDesc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SayRequest {
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SayReply {
    pub msg: String,
}

#[async_trait]
pub trait Echo: Send + Sync + 'static {
    async fn say(&self, request: SayRequest) -> Result<SayReply, MethodError>;
}

pub fn echo_service_desc() -> ServiceDesc<dyn Echo> {
    ServiceDesc::new("Echo").method(crate::unary_method!(dyn Echo, "Say", SayRequest, say))
}

/// Replies with the message it was sent.
#[derive(Debug, Default)]
pub struct EchoServer;

#[async_trait]
impl Echo for EchoServer {
    async fn say(&self, request: SayRequest) -> Result<SayReply, MethodError> {
        Ok(SayReply { msg: request.msg })
    }
}
