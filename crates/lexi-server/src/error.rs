use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lexi_domain::error::Error;
use serde::Serialize;

/// Wraps a domain [`Error`] so handlers can return it directly and have
/// it map to the right HTTP status and a `{error, code}` JSON body
/// (spec.md §7).
pub struct ApiError(pub Error);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::Ownership { .. } | Error::Authentication { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Error::InvalidArgument { .. } | Error::Pdf { .. } => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            Error::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            Error::Export { .. } | Error::Llm { .. } | Error::Dispatcher { .. } => {
                (StatusCode::BAD_GATEWAY, "EXTERNAL_ERROR")
            }
            Error::Config { .. } | Error::ConfigInvalid { .. } | Error::ConfigMissing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
            Error::Database { .. }
            | Error::ProgressBus { .. }
            | Error::Infrastructure { .. }
            | Error::Internal { .. }
            | Error::Json { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorBody {
            error: self.0.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}
