//! Governor policy parameters: cooldown, attempt limit, ban length, and
//! credential sizing.
//!
//! Every field has a serde default so a partial `[governor]` table in the
//! daemon's TOML config only overrides what it names.

use serde::{Deserialize, Serialize};

/// Abuse-control and credential parameters for the subscription governor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorParams {
    /// Minimum seconds between two verification emails to the same record.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Sends allowed before the next eligible request bans the record.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// How long a ban lasts, in seconds.
    #[serde(default = "default_ban_duration_secs")]
    pub ban_duration_secs: u64,

    /// Verification code length in hex characters (must be even).
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Lifetime of a signed verification token, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Upper bound on any single store or mail call, in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_ban_duration_secs() -> u64 {
    24 * 60 * 60
}

fn default_code_length() -> usize {
    24
}

fn default_token_ttl_secs() -> u64 {
    15 * 60
}

fn default_call_timeout_ms() -> u64 {
    10_000
}

impl Default for GovernorParams {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            max_attempts: default_max_attempts(),
            ban_duration_secs: default_ban_duration_secs(),
            code_length: default_code_length(),
            token_ttl_secs: default_token_ttl_secs(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}
