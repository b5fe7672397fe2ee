use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use diesel_async::pooled_connection::PoolError;
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] bb8::RunError<PoolError>),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn missing(field: &str) -> Self {
        ApiError::BadRequest(format!("{} is required", field))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            ErrorResponse {
                error: INTERNAL_ERROR.to_string(),
                details: None,
            }
        } else {
            tracing::warn!("Rejected request: {}", self);
            ErrorResponse {
                error: self.to_string(),
                details: None,
            }
        };

        let mut response = (status, Json(body)).into_response();
        if status.is_server_error() {
            response.extensions_mut().insert(ErrorDetails(self.to_string()));
        }
        response
    }
}

/// Underlying message of a 5xx, carried on the response for
/// [`attach_error_details`].
#[derive(Debug, Clone)]
pub struct ErrorDetails(pub String);

/// Adds `details` to 5xx bodies when the service runs with
/// `--expose-error-details`.
pub async fn attach_error_details(State(state): State<AppState>, response: Response) -> Response {
    if !state.config.expose_error_details {
        return response;
    }
    let Some(ErrorDetails(details)) = response.extensions().get::<ErrorDetails>().cloned() else {
        return response;
    };

    let body = ErrorResponse {
        error: INTERNAL_ERROR.to_string(),
        details: Some(details),
    };
    (response.status(), Json(body)).into_response()
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(ApiError::missing("lead_id").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("Lead 1 not found").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(diesel::result::Error::NotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::missing("date").to_string(), "date is required");
    }

    #[test]
    fn server_errors_carry_their_details() {
        let response = ApiError::from(diesel::result::Error::NotFound).into_response();
        let details = response.extensions().get::<ErrorDetails>().unwrap();
        assert_eq!(details.0, "database error: Record not found");

        let response = ApiError::not_found("Lead 1 not found").into_response();
        assert!(response.extensions().get::<ErrorDetails>().is_none());
    }
}
