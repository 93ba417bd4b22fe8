use axum::{Json, http::StatusCode, response::IntoResponse};
use tracing::warn;

/// Error type for the local invocation server.
///
/// The standard error response looks like this:
///
/// ```json
/// {
///     "error": "ERROR_CODE",
///     "message": "Error message"
/// }
/// ```
#[derive(Debug, thiserror::Error, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AppError {
    #[error("Time budget too large, limit is {0} ms")]
    BudgetTooLarge(u64),

    #[error("Result too large, limit is {0}")]
    LimitTooLarge(usize),

    #[error("Unknown stream: '{0}'")]
    UnknownStream(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BudgetTooLarge(_) | AppError::LimitTooLarge(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownStream(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// Converts errors into HTTP responses.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Error code is the enum variant name in SCREAMING_SNAKE_CASE.
        let error_code = self.as_ref();
        let message = self.to_string();
        let json = serde_json::json!({ "error": error_code, "message": message });

        warn!("Returning error {error_code}: {message}");
        (self.status_code(), Json(json)).into_response()
    }
}
