use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// API-layer error type
#[derive(Debug)]
pub enum ApiError {
    /// 400 - Bad request (invalid input)
    BadRequest(String),

    /// 500 - Internal error
    Internal(String),

    /// 503 - Service unavailable (e.g., no data loaded yet)
    Unavailable(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg),
        };

        let body = ErrorBody {
            error: error_type.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

// Convert engine errors to API errors
impl From<crate::engine::EngineError> for ApiError {
    fn from(err: crate::engine::EngineError) -> Self {
        use crate::engine::EngineError;
        use ticketrag_store::StoreError;
        match err {
            EngineError::Store(StoreError::TableNotFound(_)) => ApiError::Unavailable(
                "No tickets loaded yet. Run ticket-loader to build the index.".into(),
            ),
            EngineError::Store(e) => ApiError::Internal(e.to_string()),
            EngineError::Embedding(e) => ApiError::Internal(format!("Embedding error: {}", e)),
            EngineError::Generation(e) => ApiError::Internal(format!("LLM error: {}", e)),
        }
    }
}

// Convert embed errors (the chat handler embeds before entering the engine)
impl From<ticketrag_store::EmbedError> for ApiError {
    fn from(err: ticketrag_store::EmbedError) -> Self {
        ApiError::Internal(format!("Embedding error: {}", err))
    }
}

// Convert store errors directly (stats endpoint talks to the store without the engine)
impl From<ticketrag_store::StoreError> for ApiError {
    fn from(err: ticketrag_store::StoreError) -> Self {
        ApiError::from(crate::engine::EngineError::Store(err))
    }
}
