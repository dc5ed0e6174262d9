//! HTTP request handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use wordrop_mailer::NotificationSender;
use wordrop_store::SubscriptionStore;
use wordrop_subscription::Governor;
use wordrop_types::Email;

use crate::RpcError;

/// Longest accepted display name, in characters.
pub const MAX_USERNAME_CHARS: usize = 64;

// ── Subscription ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

impl SubscribeRequest {
    /// Trimmed username and parsed email, or a 400-worthy message.
    pub fn validate(&self) -> Result<(String, Email), RpcError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(RpcError::InvalidRequest("username is required".into()));
        }
        if username.chars().count() > MAX_USERNAME_CHARS {
            return Err(RpcError::InvalidRequest(format!(
                "username must be at most {MAX_USERNAME_CHARS} characters"
            )));
        }
        if self.email.trim().is_empty() {
            return Err(RpcError::InvalidRequest("email is required".into()));
        }
        let email = Email::parse(&self.email)
            .map_err(|_| RpcError::InvalidRequest("email address is not valid".into()))?;
        Ok((username.to_string(), email))
    }
}

// ── Verification ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub async fn subscribe<S, N>(
    State(governor): State<Arc<Governor<S, N>>>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, RpcError>
where
    S: SubscriptionStore + 'static,
    N: NotificationSender + 'static,
{
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "rejected subscription body");
        RpcError::InvalidRequest("request body must be JSON with username and email".into())
    })?;
    let (username, email) = request.validate()?;

    governor.request_subscription(&username, &email).await?;
    Ok(Json(MessageResponse {
        message: "verification email sent".into(),
    }))
}

pub async fn verify<S, N>(
    State(governor): State<Arc<Governor<S, N>>>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, RpcError>
where
    S: SubscriptionStore + 'static,
    N: NotificationSender + 'static,
{
    let token = query
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| RpcError::InvalidRequest("token is required".into()))?;

    governor.confirm_token(&token).await?;
    Ok(Json(MessageResponse {
        message: "email verified".into(),
    }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}
