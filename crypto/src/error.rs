use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("token signing secret is not configured")]
    MissingSecret,

    #[error("verification code length must be a positive even number, got {0}")]
    InvalidCodeLength(usize),

    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("failed to encode token claims: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a presented token was rejected.
///
/// The kinds are kept apart so callers and tests can tell them apart; the
/// governor collapses all of them into one opaque verification failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("malformed token: {0}")]
    Malformed(String),
}
