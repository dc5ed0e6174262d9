//! Errors raised while constructing validated value types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid subscriber id")]
    InvalidSubscriberId,
}
