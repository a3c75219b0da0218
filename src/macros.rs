/// Build a [`MethodDesc`](crate::rpc::MethodDesc) for one unary method of an
/// `async_trait` service interface, the way generated service code does.
///
/// Usage:
/// ```rust,ignore
/// #[async_trait]
/// pub trait Echo: Send + Sync + 'static {
///     async fn say(&self, request: SayRequest) -> Result<SayReply, MethodError>;
/// }
///
/// let desc = ServiceDesc::<dyn Echo>::new("Echo")
///     .method(unary_method!(dyn Echo, "Say", SayRequest, say));
/// ```
///
/// The request is decoded with the dispatcher's decoder, the trait method is
/// awaited, and its error (if any) becomes a
/// [`GatewayError::Invocation`](crate::rpc::GatewayError::Invocation).
#[macro_export]
macro_rules! unary_method {
    ($service:ty, $name:literal, $request:ty, $method:ident) => {
        $crate::rpc::MethodDesc::<$service> {
            method_name: $name,
            handler: |implementation: ::std::sync::Arc<$service>,
                      decoder: $crate::rpc::JsonDecoder,
                      body: $crate::rpc::Bytes|
             -> $crate::rpc::MethodFuture {
                ::std::boxed::Box::pin(async move {
                    let request: $request = decoder.decode(&body)?;
                    let reply = implementation
                        .$method(request)
                        .await
                        .map_err($crate::rpc::GatewayError::invocation)?;
                    Ok::<_, $crate::rpc::GatewayError>(
                        ::std::boxed::Box::new(reply) as ::std::boxed::Box<dyn $crate::rpc::Reply>
                    )
                })
            },
        }
    };
}
