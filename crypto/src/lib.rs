//! Cryptographic pieces of the subscription flow.
//!
//! - **Verification codes**: fixed-length hex strings drawn from OS entropy
//! - **Verification tokens**: HS256-signed, time-boxed envelopes binding a
//!   subscriber id to its current code

pub mod code;
pub mod error;
pub mod token;

pub use code::{CodeGenerator, EntropySource, OsEntropy};
pub use error::{CryptoError, TokenError};
pub use token::{TokenCodec, VerificationClaims};
