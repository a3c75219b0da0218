pub mod descriptor;
pub mod error;

pub use bytes::Bytes;
pub use descriptor::{JsonDecoder, MethodDesc, MethodFuture, MethodHandler, Reply, ServiceDesc};
pub use error::{GatewayError, MethodError};
