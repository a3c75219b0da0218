use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Error returned by a service implementation's business logic.
pub type MethodError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering services or dispatching requests.
///
/// Registration errors (`DuplicateService`, `DuplicateMethod`,
/// `InvalidRouteName`, `InterfaceConformance`) are configuration errors and
/// should abort startup. The rest are per-request and only ever reach the
/// caller of that one request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("duplicate service registration for {0:?}")]
    DuplicateService(String),

    #[error("service {service:?} declares method {method:?} more than once")]
    DuplicateMethod { service: String, method: String },

    #[error("{0:?} cannot be used as a route segment")]
    InvalidRouteName(String),

    #[error("the handler registered for {service:?} does not satisfy {expected}")]
    InterfaceConformance {
        service: String,
        expected: &'static str,
    },

    #[error("failed to read request body: {0}")]
    RequestRead(String),

    #[error("failed to decode request: {0}")]
    Decode(serde_json::Error),

    #[error("{0}")]
    Invocation(MethodError),

    #[error("failed to encode reply: {0}")]
    Encode(serde_json::Error),

    #[error("404 page not found: {0}")]
    RouteNotFound(String),
}

impl GatewayError {
    pub fn invocation(err: impl Into<MethodError>) -> Self {
        GatewayError::Invocation(err.into())
    }

    /// HTTP status reported to the caller when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
