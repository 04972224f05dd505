use axum::Json;
use http::StatusCode;
use passkey_ceremony::CoordinationError;
use serde_json::{Value, json};

/// Error half of every handler result: status plus `{"error": "<message>"}`.
pub type ErrorResponse = (StatusCode, Json<Value>);

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, ErrorResponse>;
}

/// HTTP status for a coordinator error
pub fn status_code(err: &CoordinationError) -> StatusCode {
    match err {
        CoordinationError::BadRequest(_)
        | CoordinationError::AlreadyExists(_)
        | CoordinationError::ChallengeMismatch
        | CoordinationError::AttestationInvalid(_) => StatusCode::BAD_REQUEST,
        CoordinationError::UserNotFound(_) | CoordinationError::SessionNotFound => {
            StatusCode::NOT_FOUND
        }
        CoordinationError::AssertionInvalid(_) | CoordinationError::CounterRegression { .. } => {
            StatusCode::UNAUTHORIZED
        }
        CoordinationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<T> IntoResponseError<T> for Result<T, CoordinationError> {
    fn into_response_error(self) -> Result<T, ErrorResponse> {
        self.map_err(|e| (status_code(&e), Json(json!({ "error": e.to_string() }))))
    }
}
