use crate::rpc::error::GatewayError;
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A reply value returned by a method invocation.
///
/// Encoding is deferred to the dispatcher so that a failure to encode can be
/// reported separately from a failure inside the method.
pub trait Reply: Send {
    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error>;
}

impl<T> Reply for T
where
    T: Serialize + Send,
{
    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

pub type MethodFuture = BoxFuture<'static, Result<Box<dyn Reply>, GatewayError>>;

/// Invocation contract of one unary method: given the implementation, a
/// decoder and the raw request bytes, produce the reply.
pub type MethodHandler<S> = fn(Arc<S>, JsonDecoder, Bytes) -> MethodFuture;

/// Turns the JSON request encoding into a method's native request type.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    pub fn decode<T: DeserializeOwned>(&self, raw: &[u8]) -> Result<T, GatewayError> {
        serde_json::from_slice(raw).map_err(GatewayError::Decode)
    }
}

/// Describes one RPC method of a service whose implementation interface is `S`.
pub struct MethodDesc<S: ?Sized> {
    pub method_name: &'static str,
    pub handler: MethodHandler<S>,
}

impl<S: ?Sized> Clone for MethodDesc<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for MethodDesc<S> {}

impl<S: ?Sized> std::fmt::Debug for MethodDesc<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDesc")
            .field("method_name", &self.method_name)
            .finish()
    }
}

/// Describes one RPC service.
///
/// `S` is the interface a registered implementation must satisfy, usually a
/// trait object type such as `dyn Echo`. Generated code builds one of these
/// per service:
///
/// ```rust,ignore
/// ServiceDesc::<dyn Echo>::new("Echo")
///     .method(unary_method!(dyn Echo, "Say", SayRequest, say));
/// ```
pub struct ServiceDesc<S: ?Sized> {
    pub service_name: &'static str,
    pub methods: Vec<MethodDesc<S>>,
}

impl<S: ?Sized> ServiceDesc<S> {
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, method: MethodDesc<S>) -> Self {
        self.methods.push(method);
        self
    }

    /// Name of the interface type implementations are checked against.
    pub fn interface_name(&self) -> &'static str {
        std::any::type_name::<S>()
    }
}

impl<S: ?Sized> std::fmt::Debug for ServiceDesc<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDesc")
            .field("service_name", &self.service_name)
            .field("interface", &self.interface_name())
            .field("methods", &self.methods)
            .finish()
    }
}
