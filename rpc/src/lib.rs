//! HTTP API for the Wordrop subscription service.
//!
//! Provides endpoints for:
//! - Requesting a subscription (sends a verification email)
//! - Confirming a verification link
//! - Liveness checks

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcServer};
