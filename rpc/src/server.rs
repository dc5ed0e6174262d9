//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use wordrop_mailer::NotificationSender;
use wordrop_store::SubscriptionStore;
use wordrop_subscription::Governor;

use crate::error::RpcError;
use crate::handlers;

/// Build the router for a governor.
pub fn router<S, N>(governor: Arc<Governor<S, N>>) -> Router
where
    S: SubscriptionStore + 'static,
    N: NotificationSender + 'static,
{
    Router::new()
        .route("/subscriptions", post(handlers::subscribe::<S, N>))
        .route("/subscriptions/verify", get(handlers::verify::<S, N>))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(governor)
}

pub struct RpcServer {
    pub addr: SocketAddr,
}

impl RpcServer {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn serve<S, N>(
        &self,
        governor: Arc<Governor<S, N>>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError>
    where
        S: SubscriptionStore + 'static,
        N: NotificationSender + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {}: {e}", self.addr)))?;
        tracing::info!(addr = %self.addr, "HTTP API listening");

        axum::serve(listener, router(governor))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
