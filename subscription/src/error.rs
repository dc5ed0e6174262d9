use thiserror::Error;
use wordrop_crypto::{CryptoError, TokenError};
use wordrop_mailer::MailError;
use wordrop_store::StoreError;
use wordrop_types::{Ineligible, Timestamp};

/// Errors returned by the governor.
///
/// Policy outcomes (`AlreadyVerified`, `RequestTooSoon`, `Banned`) carry no
/// cause. `VerificationInvalid` keeps the underlying reason for logging only;
/// callers must not show it to end users.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("subscription is already verified")]
    AlreadyVerified,

    #[error("verification requested too soon, retry in {retry_after_secs}s")]
    RequestTooSoon { retry_after_secs: u64 },

    #[error("subscription is banned until {until}")]
    Banned { until: Timestamp },

    #[error("verification failed")]
    VerificationInvalid {
        #[source]
        cause: VerificationFailure,
    },

    #[error("failed to {context}")]
    Infrastructure {
        context: &'static str,
        #[source]
        source: InfraCause,
    },

    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
}

/// Coarse classification for callers that branch on the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyVerified,
    RequestTooSoon,
    Banned,
    VerificationInvalid,
    Infrastructure,
    Timeout,
}

/// Why a verification attempt was refused.
#[derive(Debug, Error)]
pub enum VerificationFailure {
    #[error("token rejected: {0}")]
    Token(#[from] TokenError),

    #[error("no record matches the presented id and code")]
    NoMatchingRecord,
}

/// The collaborator failure behind an `Infrastructure` error.
#[derive(Debug, Error)]
pub enum InfraCause {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl SubscriptionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyVerified => ErrorKind::AlreadyVerified,
            Self::RequestTooSoon { .. } => ErrorKind::RequestTooSoon,
            Self::Banned { .. } => ErrorKind::Banned,
            Self::VerificationInvalid { .. } => ErrorKind::VerificationInvalid,
            Self::Infrastructure { .. } => ErrorKind::Infrastructure,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Only a timed-out call is worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub(crate) fn infra(context: &'static str) -> impl FnOnce(InfraCause) -> Self {
        move |source| Self::Infrastructure { context, source }
    }

    /// A lost optimistic-concurrency race: stale version or a concurrent
    /// first request for the same email.
    pub(crate) fn is_write_race(&self) -> bool {
        matches!(
            self,
            Self::Infrastructure {
                source: InfraCause::Store(StoreError::Conflict { .. } | StoreError::Duplicate(_)),
                ..
            }
        )
    }
}

impl From<Ineligible> for SubscriptionError {
    fn from(reason: Ineligible) -> Self {
        match reason {
            Ineligible::AlreadyVerified => Self::AlreadyVerified,
            Ineligible::RequestTooSoon { retry_after_secs } => Self::RequestTooSoon { retry_after_secs },
            Ineligible::Banned { until } => Self::Banned { until },
        }
    }
}
