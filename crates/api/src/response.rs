use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

/// A JSON body sent with an explicit status code.
#[derive(Debug)]
pub struct AppSuccess<T: Serialize>(pub StatusCode, pub T);

impl<T: Serialize> AppSuccess<T> {
    pub fn ok(body: T) -> Self {
        Self(StatusCode::OK, body)
    }

    pub fn created(body: T) -> Self {
        Self(StatusCode::CREATED, body)
    }
}

impl<T: Serialize> IntoResponse for AppSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct Done {
    pub success: bool,
}

impl AppSuccess<Done> {
    pub fn done() -> Self {
        Self::ok(Done { success: true })
    }
}

/// Error response rendered as `{"error": "...", ..context}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: anyhow::Error,
    pub context: Map<String, Value>,
}

impl AppError {
    pub fn new(status: StatusCode, err: anyhow::Error) -> Self {
        Self { status, error: err, context: Map::new() }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, anyhow::anyhow!("{}", message))
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!("unauthorized"))
    }

    /// Attaches an extra top-level field to the error body.
    pub fn with_context<T: Serialize>(mut self, key: &str, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.context.insert(key.to_string(), value);
            }
            Err(e) => tracing::warn!("[AppError] dropping context '{}': {}", key, e),
        }
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("CODE: {}, MESSAGE: {}", self.status.as_u16(), self.error);
        } else {
            tracing::warn!("CODE: {}, MESSAGE: {}", self.status.as_u16(), self.error);
        }

        let mut body = self.context;
        body.insert("error".to_string(), Value::String(self.error.to_string()));
        (self.status, Json(Value::Object(body))).into_response()
    }
}

// Anything else bubbling up through `?` is an internal failure.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}
