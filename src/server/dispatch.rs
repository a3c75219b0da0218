use crate::rpc::{GatewayError, JsonDecoder, MethodDesc, MethodHandler};
use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, warn};

/// Body substituted for an empty request, so methods without required
/// fields can be called with no payload.
const EMPTY_OBJECT: &[u8] = b"{}";

/// An installed per-method request handler.
pub type MethodRoute = Arc<dyn Fn(Body) -> BoxFuture<'static, Response> + Send + Sync>;

/// Message of the error that ended a request, attached to the error
/// response so wrapping layers can report it.
#[derive(Debug, Clone)]
pub struct FailureReason(pub String);

#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Upper bound on the request body; larger bodies fail to read.
    pub max_body_bytes: usize,
}

/// Build the handler bridging one HTTP request body to one invocation of
/// `method` on `implementation`.
///
/// Every failure ends the request with a 500 carrying the error message; the
/// handler itself holds no state between requests.
pub fn build_handler<S>(
    implementation: Arc<S>,
    method: &MethodDesc<S>,
    options: DispatchOptions,
) -> MethodRoute
where
    S: ?Sized + Send + Sync + 'static,
{
    let invoke = method.handler;
    let method_name = method.method_name;

    Arc::new(move |body: Body| -> BoxFuture<'static, Response> {
        let implementation = implementation.clone();
        Box::pin(async move {
            debug!("Service method call: {}", method_name);
            match dispatch(implementation, invoke, body, options).await {
                Ok(response) => response,
                Err(err) => {
                    warn!("Method {} failed: {}", method_name, err);
                    let reason = FailureReason(err.to_string());
                    let mut response = err.into_response();
                    response.extensions_mut().insert(reason);
                    response
                }
            }
        })
    })
}

async fn dispatch<S>(
    implementation: Arc<S>,
    invoke: MethodHandler<S>,
    body: Body,
    options: DispatchOptions,
) -> Result<Response, GatewayError>
where
    S: ?Sized,
{
    let mut data = axum::body::to_bytes(body, options.max_body_bytes)
        .await
        .map_err(|e| GatewayError::RequestRead(e.to_string()))?;
    if data.is_empty() {
        data = Bytes::from_static(EMPTY_OBJECT);
    }

    let reply = invoke(implementation, JsonDecoder, data).await?;
    let encoded = Bytes::from(reply.to_json().map_err(GatewayError::Encode)?);

    // The body is a single buffer, so hyper sends Content-Length and writes
    // it in full or drops the connection.
    Ok(([(header::CONTENT_TYPE, "application/json")], encoded).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{MethodFuture, Reply};
    use axum::body::HttpBody;
    use axum::http::StatusCode;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    #[derive(Deserialize)]
    struct AddRequest {
        #[serde(default)]
        by: usize,
    }

    #[derive(Serialize)]
    struct AddReply {
        total: usize,
    }

    fn add(counter: Arc<Counter>, decoder: JsonDecoder, body: Bytes) -> MethodFuture {
        Box::pin(async move {
            let request: AddRequest = decoder.decode(&body)?;
            let total = counter.calls.fetch_add(request.by, Ordering::SeqCst) + request.by;
            Ok(Box::new(AddReply { total }) as Box<dyn Reply>)
        })
    }

    fn options() -> DispatchOptions {
        DispatchOptions {
            max_body_bytes: 1024,
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_handler_invokes_method() {
        let counter = Arc::new(Counter::default());
        let desc = MethodDesc { method_name: "Add", handler: add };
        let route = build_handler(counter.clone(), &desc, options());

        let response = route(Body::from(r#"{"by":2}"#)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(body_text(response).await, r#"{"total":2}"#);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reply_body_has_exact_length() {
        let desc = MethodDesc { method_name: "Add", handler: add };
        let route = build_handler(Arc::new(Counter::default()), &desc, options());

        let response = route(Body::from(r#"{"by":40}"#)).await;
        let expected = r#"{"total":40}"#;
        assert_eq!(response.body().size_hint().exact(), Some(expected.len() as u64));
        assert_eq!(body_text(response).await, expected);
    }

    #[tokio::test]
    async fn test_empty_body_is_treated_as_empty_object() {
        let counter = Arc::new(Counter::default());
        let desc = MethodDesc { method_name: "Add", handler: add };
        let route = build_handler(counter, &desc, options());

        let empty = body_text(route(Body::empty()).await).await;
        let braces = body_text(route(Body::from("{}")).await).await;
        assert_eq!(empty, r#"{"total":0}"#);
        assert_eq!(empty, braces);
    }

    #[tokio::test]
    async fn test_decode_failure_skips_invocation() {
        let counter = Arc::new(Counter::default());
        let desc = MethodDesc { method_name: "Add", handler: add };
        let route = build_handler(counter.clone(), &desc, options());

        let response = route(Body::from(r#"{"by":}"#)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.starts_with("failed to decode request"));
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_response_carries_failure_reason() {
        let desc = MethodDesc { method_name: "Add", handler: add };
        let route = build_handler(Arc::new(Counter::default()), &desc, options());

        let response = route(Body::from("not json")).await;
        let reason = response.extensions().get::<FailureReason>().cloned().unwrap();
        assert!(reason.0.starts_with("failed to decode request"));
        assert_eq!(body_text(response).await, reason.0);

        let response = route(Body::from("{}")).await;
        assert!(response.extensions().get::<FailureReason>().is_none());
    }

    #[tokio::test]
    async fn test_oversized_body_is_a_read_error() {
        let counter = Arc::new(Counter::default());
        let desc = MethodDesc { method_name: "Add", handler: add };
        let route = build_handler(counter.clone(), &desc, DispatchOptions { max_body_bytes: 4 });

        let response = route(Body::from(r#"{"by":1}"#)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.starts_with("failed to read request body"));
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_encode_failure_is_reported() {
        struct Unencodable;

        impl Serialize for Unencodable {
            fn serialize<Ser: serde::Serializer>(&self, _: Ser) -> Result<Ser::Ok, Ser::Error> {
                Err(serde::ser::Error::custom("reply cannot be encoded"))
            }
        }

        fn broken(_: Arc<Counter>, _: JsonDecoder, _: Bytes) -> MethodFuture {
            Box::pin(async { Ok(Box::new(Unencodable) as Box<dyn Reply>) })
        }

        let desc = MethodDesc { method_name: "Broken", handler: broken };
        let route = build_handler(Arc::new(Counter::default()), &desc, options());

        let response = route(Body::empty()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("reply cannot be encoded"));
    }
}
