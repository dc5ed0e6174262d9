//! The subscription record and its state transitions.
//!
//! Transitions are plain methods on an exclusively owned record. Every
//! time-dependent method takes `now` explicitly so the governor decides what
//! "now" is (and tests can pin it).

use crate::email::Email;
use crate::id::SubscriberId;
use crate::params::GovernorParams;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Fields supplied by the caller when a subscription is first requested.
/// The store assigns the id and bookkeeping timestamps on create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSubscription {
    pub username: String,
    pub email: Email,
}

/// One record per unique email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: SubscriberId,
    pub username: String,
    pub email: Email,
    pub verified: bool,
    pub verification_attempts: u32,
    /// When the most recent verification email went out. `EPOCH` before the first send.
    pub last_verified_at: Timestamp,
    pub banned: bool,
    /// Only meaningful while `banned` is set.
    pub banned_until: Timestamp,
    pub verification_code: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Optimistic-concurrency token; the store bumps it on every update.
    pub version: u64,
}

/// Why a record may not receive another verification email right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ineligible {
    AlreadyVerified,
    RequestTooSoon { retry_after_secs: u64 },
    Banned { until: Timestamp },
}

impl SubscriptionRecord {
    /// A freshly created, never-mailed record.
    pub fn create(id: SubscriberId, new: NewSubscription, now: Timestamp) -> Self {
        Self {
            id,
            username: new.username,
            email: new.email,
            verified: false,
            verification_attempts: 0,
            last_verified_at: Timestamp::EPOCH,
            banned: false,
            banned_until: Timestamp::EPOCH,
            verification_code: String::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Lift an expired ban. Runs before any eligibility check so a ban that
    /// just ran out does not block the retry that follows it.
    ///
    /// Returns whether the ban was lifted.
    pub fn refresh_banned_status(&mut self, now: Timestamp) -> bool {
        if self.banned && now >= self.banned_until {
            self.banned = false;
            self.verification_attempts = 0;
            self.banned_until = Timestamp::EPOCH;
            return true;
        }
        false
    }

    /// Eligibility for a new verification email. Never mutates.
    ///
    /// Precedence is fixed: already-verified, then cooldown, then active ban.
    /// `AlreadyVerified` applies only to a verified record that is not banned,
    /// and it wins even inside the cooldown window. A record that is both
    /// verified and banned skips that rule and goes through the cooldown
    /// check (`RequestTooSoon`) and then the ban check (`Banned`).
    pub fn check_verifiable(&self, now: Timestamp, params: &GovernorParams) -> Result<(), Ineligible> {
        if self.verified && !self.banned {
            return Err(Ineligible::AlreadyVerified);
        }

        let elapsed = self.last_verified_at.elapsed_since(now);
        if !self.last_verified_at.is_epoch() && elapsed < params.cooldown_secs {
            return Err(Ineligible::RequestTooSoon {
                retry_after_secs: params.cooldown_secs - elapsed,
            });
        }

        if self.banned && now < self.banned_until {
            return Err(Ineligible::Banned {
                until: self.banned_until,
            });
        }
        Ok(())
    }

    /// Whether the attempt counter has reached the configured limit.
    pub fn should_be_banned(&self, params: &GovernorParams) -> bool {
        self.verification_attempts >= params.max_attempts
    }

    pub fn ban(&mut self, now: Timestamp, params: &GovernorParams) {
        self.banned = true;
        self.banned_until = now.plus_secs(params.ban_duration_secs);
        self.verification_attempts = 0;
        self.verified = false;
    }

    pub fn replace_verification_code(&mut self, code: String) {
        self.verification_code = code;
    }

    /// Record that a verification email has just been delivered.
    pub fn mark_verification_sent(&mut self, now: Timestamp) {
        self.verification_attempts += 1;
        self.last_verified_at = now;
    }

    pub fn mark_verified(&mut self) {
        self.verified = true;
        self.verification_attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(now: Timestamp) -> SubscriptionRecord {
        SubscriptionRecord::create(
            SubscriberId::from_sequence(1),
            NewSubscription {
                username: "testuser".into(),
                email: Email::parse("test@example.com").unwrap(),
            },
            now,
        )
    }

    #[test]
    fn fresh_record_is_verifiable() {
        let now = Timestamp::new(1_000_000);
        let params = GovernorParams::default();
        assert_eq!(record(now).check_verifiable(now, &params), Ok(()));
    }

    #[test]
    fn already_verified_rejected() {
        let now = Timestamp::new(1_000_000);
        let mut rec = record(now);
        rec.verified = true;
        assert_eq!(
            rec.check_verifiable(now, &GovernorParams::default()),
            Err(Ineligible::AlreadyVerified)
        );
    }

    #[test]
    fn already_verified_wins_over_cooldown() {
        let now = Timestamp::new(1_000_000);
        let mut rec = record(now);
        rec.verified = true;
        rec.last_verified_at = now;
        assert_eq!(
            rec.check_verifiable(now, &GovernorParams::default()),
            Err(Ineligible::AlreadyVerified)
        );
    }

    #[test]
    fn verified_and_banned_reports_ban_after_cooldown() {
        let now = Timestamp::new(1_000_000);
        let mut rec = record(now);
        rec.verified = true;
        rec.banned = true;
        rec.banned_until = now.plus_secs(3_600);
        rec.last_verified_at = Timestamp::new(now.as_secs() - 120);
        assert_eq!(
            rec.check_verifiable(now, &GovernorParams::default()),
            Err(Ineligible::Banned {
                until: now.plus_secs(3_600)
            })
        );
    }

    #[test]
    fn verified_and_banned_inside_cooldown_is_too_soon() {
        let now = Timestamp::new(1_000_000);
        let mut rec = record(now);
        rec.verified = true;
        rec.banned = true;
        rec.banned_until = now.plus_secs(3_600);
        rec.last_verified_at = Timestamp::new(now.as_secs() - 10);
        assert_eq!(
            rec.check_verifiable(now, &GovernorParams::default()),
            Err(Ineligible::RequestTooSoon { retry_after_secs: 50 })
        );
    }

    #[test]
    fn request_too_soon_reports_remaining_cooldown() {
        let now = Timestamp::new(1_000_000);
        let mut rec = record(now);
        rec.last_verified_at = Timestamp::new(now.as_secs() - 30);
        assert_eq!(
            rec.check_verifiable(now, &GovernorParams::default()),
            Err(Ineligible::RequestTooSoon { retry_after_secs: 30 })
        );
    }

    #[test]
    fn active_ban_rejected() {
        let now = Timestamp::new(1_000_000);
        let mut rec = record(now);
        rec.banned = true;
        rec.banned_until = now.plus_secs(3_600);
        assert_eq!(
            rec.check_verifiable(now, &GovernorParams::default()),
            Err(Ineligible::Banned {
                until: now.plus_secs(3_600)
            })
        );
    }

    #[test]
    fn cooldown_takes_precedence_over_ban() {
        let now = Timestamp::new(1_000_000);
        let mut rec = record(now);
        rec.last_verified_at = now;
        rec.banned = true;
        rec.banned_until = now.plus_secs(3_600);
        assert!(matches!(
            rec.check_verifiable(now, &GovernorParams::default()),
            Err(Ineligible::RequestTooSoon { .. })
        ));
    }

    #[test]
    fn refresh_keeps_active_ban() {
        let now = Timestamp::new(1_000_000);
        let mut rec = record(now);
        rec.banned = true;
        rec.banned_until = now.plus_secs(1);
        rec.verification_attempts = 2;
        assert!(!rec.refresh_banned_status(now));
        assert!(rec.banned);
        assert_eq!(rec.verification_attempts, 2);
    }

    #[test]
    fn refresh_lifts_expired_ban() {
        let now = Timestamp::new(1_000_000);
        let mut rec = record(now);
        rec.banned = true;
        rec.banned_until = now;
        rec.verification_attempts = 2;
        assert!(rec.refresh_banned_status(now));
        assert!(!rec.banned);
        assert_eq!(rec.verification_attempts, 0);
        assert_eq!(rec.banned_until, Timestamp::EPOCH);
    }

    #[test]
    fn ban_threshold() {
        let params = GovernorParams::default();
        let mut rec = record(Timestamp::new(0));
        rec.verification_attempts = params.max_attempts - 1;
        assert!(!rec.should_be_banned(&params));
        rec.verification_attempts = params.max_attempts;
        assert!(rec.should_be_banned(&params));
    }

    #[test]
    fn ban_resets_counters() {
        let now = Timestamp::new(1_000_000);
        let params = GovernorParams::default();
        let mut rec = record(now);
        rec.verified = true;
        rec.verification_attempts = params.max_attempts;
        rec.ban(now, &params);
        assert!(rec.banned);
        assert!(!rec.verified);
        assert_eq!(rec.verification_attempts, 0);
        assert_eq!(rec.banned_until, now.plus_secs(params.ban_duration_secs));
    }

    #[test]
    fn mark_verification_sent_counts_attempt() {
        let now = Timestamp::new(1_000_000);
        let mut rec = record(now);
        rec.mark_verification_sent(now);
        assert_eq!(rec.verification_attempts, 1);
        assert_eq!(rec.last_verified_at, now);
    }

    #[test]
    fn mark_verified_resets_attempts() {
        let mut rec = record(Timestamp::new(0));
        rec.verification_attempts = 2;
        rec.mark_verified();
        assert!(rec.verified);
        assert_eq!(rec.verification_attempts, 0);
    }
}
