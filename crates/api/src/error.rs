//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The request carries no usable identity.
    Unauthenticated(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Saga or query error.
    Saga(SagaError),
}

impl ApiError {
    /// Returns the HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Saga(err) => saga_error_status(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Unauthenticated(msg) | ApiError::BadRequest(msg) => msg,
            ApiError::Saga(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                }
                err.to_string()
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_status(err: &SagaError) -> StatusCode {
    match err {
        SagaError::Validation(_) | SagaError::MissingRestaurant => StatusCode::BAD_REQUEST,
        SagaError::UserNotFound(_)
        | SagaError::RestaurantNotFound(_)
        | SagaError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        SagaError::Unauthorized(_) => StatusCode::FORBIDDEN,
        SagaError::InvalidTransition(_) | SagaError::Conflict(_) => StatusCode::CONFLICT,
        SagaError::CollaboratorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        SagaError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

#[cfg(test)]
mod tests {
    use common::{OrderId, UserId};
    use order_store::StoreError;
    use saga::GatewayError;

    use super::*;

    #[test]
    fn test_saga_error_mapping() {
        let cases = [
            (SagaError::MissingRestaurant, StatusCode::BAD_REQUEST),
            (
                SagaError::UserNotFound(UserId::new("u-1")),
                StatusCode::NOT_FOUND,
            ),
            (SagaError::OrderNotFound(OrderId::new()), StatusCode::NOT_FOUND),
            (
                SagaError::Unauthorized("nope".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                SagaError::InvalidTransition("pending -> delivered".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                SagaError::CollaboratorUnavailable(GatewayError::Unavailable {
                    service: "user",
                    reason: "connection refused".to_string(),
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                SagaError::Store(StoreError::Duplicate("ORD001001".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_unauthenticated_is_401() {
        let err = ApiError::Unauthenticated("missing x-user-id".to_string());
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
