//! RPC error types and their HTTP rendering.
//!
//! Every error body is `{"message": "..."}`. Messages are fixed per kind and
//! never include ids, codes or the wrapped cause; causes go to the log.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use wordrop_subscription::SubscriptionError;

use crate::handlers::MessageResponse;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Subscription(e) => match e {
                SubscriptionError::AlreadyVerified => StatusCode::CONFLICT,
                SubscriptionError::RequestTooSoon { .. } => StatusCode::TOO_MANY_REQUESTS,
                SubscriptionError::Banned { .. } => StatusCode::FORBIDDEN,
                SubscriptionError::VerificationInvalid { .. } => StatusCode::BAD_REQUEST,
                SubscriptionError::Infrastructure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SubscriptionError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The client-facing message.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest(msg) => msg.clone(),
            Self::Subscription(e) => match e {
                SubscriptionError::AlreadyVerified => "subscription is already verified".into(),
                SubscriptionError::RequestTooSoon { .. } => {
                    "a verification email was sent recently, try again later".into()
                }
                SubscriptionError::Banned { .. } => {
                    "too many verification attempts, try again later".into()
                }
                SubscriptionError::VerificationInvalid { .. } => {
                    "invalid or expired verification link".into()
                }
                SubscriptionError::Infrastructure { .. } => "internal server error".into(),
                SubscriptionError::Timeout { .. } => "service temporarily unavailable".into(),
            },
            Self::Server(_) => "internal server error".into(),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, cause = ?std::error::Error::source(&self), "request failed");
        }

        let mut response = (
            status,
            Json(MessageResponse {
                message: self.public_message(),
            }),
        )
            .into_response();

        if let Self::Subscription(SubscriptionError::RequestTooSoon { retry_after_secs }) = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordrop_store::StoreError;
    use wordrop_subscription::{InfraCause, VerificationFailure};
    use wordrop_types::Timestamp;

    #[test]
    fn status_mapping() {
        let cases = [
            (SubscriptionError::AlreadyVerified, StatusCode::CONFLICT),
            (
                SubscriptionError::RequestTooSoon { retry_after_secs: 5 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                SubscriptionError::Banned {
                    until: Timestamp::new(1),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                SubscriptionError::VerificationInvalid {
                    cause: VerificationFailure::NoMatchingRecord,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                SubscriptionError::Timeout { operation: "load" },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(RpcError::from(err).status(), status);
        }
    }

    #[test]
    fn infrastructure_message_hides_cause() {
        let err = RpcError::from(SubscriptionError::Infrastructure {
            context: "persist subscription",
            source: InfraCause::Store(StoreError::Backend("mdb_put: MDB_MAP_FULL".into())),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn too_soon_sets_retry_after() {
        let response =
            RpcError::from(SubscriptionError::RequestTooSoon { retry_after_secs: 42 }).into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
