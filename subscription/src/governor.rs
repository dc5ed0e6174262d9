//! The governor: one read, an in-memory policy decision, at most one send,
//! one write.
//!
//! Ban and cooldown are evaluated lazily from stored timestamps on each call;
//! nothing runs in the background. Every store and sender call is bounded by
//! `call_timeout_ms`. Writes carry the record's version, and a lost race is
//! re-run once from a fresh read.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use wordrop_crypto::{CodeGenerator, TokenCodec};
use wordrop_mailer::NotificationSender;
use wordrop_store::{StoreError, SubscriptionStore};
use wordrop_types::{
    Clock, Email, GovernorParams, NewSubscription, SubscriberId, SubscriptionRecord, Timestamp,
};
use wordrop_utils::format_duration;

use crate::error::{InfraCause, SubscriptionError, VerificationFailure};

pub struct Governor<S, N> {
    store: S,
    sender: N,
    codec: TokenCodec,
    codes: CodeGenerator,
    clock: Arc<dyn Clock>,
    params: GovernorParams,
}

impl<S, N> Governor<S, N>
where
    S: SubscriptionStore,
    N: NotificationSender,
{
    pub fn new(
        store: S,
        sender: N,
        codec: TokenCodec,
        codes: CodeGenerator,
        clock: Arc<dyn Clock>,
        params: GovernorParams,
    ) -> Self {
        Self {
            store,
            sender,
            codec,
            codes,
            clock,
            params,
        }
    }

    /// Send a verification email to `email`, creating its record on first use.
    ///
    /// Existing records go through, in order: ban expiry, eligibility
    /// (already verified, cooldown, active ban), the attempt threshold, then
    /// the send itself.
    pub async fn request_subscription(
        &self,
        username: &str,
        email: &Email,
    ) -> Result<(), SubscriptionError> {
        match self.try_request(username, email).await {
            Err(e) if e.is_write_race() => {
                tracing::debug!(email = %email, "subscription changed concurrently, retrying once");
                self.try_request(username, email).await
            }
            other => other,
        }
    }

    /// Mark the record identified by `(id, code)` as verified.
    ///
    /// An unknown id and a stale code are indistinguishable to the caller.
    pub async fn confirm_verification(
        &self,
        id: &SubscriberId,
        code: &str,
    ) -> Result<(), SubscriptionError> {
        match self.try_confirm(id, code).await {
            Err(e) if e.is_write_race() => {
                tracing::debug!(%id, "subscription changed concurrently, retrying once");
                self.try_confirm(id, code).await
            }
            other => other,
        }
    }

    /// Validate a signed token and confirm the verification it carries.
    pub async fn confirm_token(&self, token: &str) -> Result<(), SubscriptionError> {
        let claims = self
            .codec
            .parse(token, self.clock.now())
            .map_err(|e| {
                tracing::warn!(error = %e, "rejected verification token");
                SubscriptionError::VerificationInvalid { cause: e.into() }
            })?;
        self.confirm_verification(&claims.id, &claims.verification_code)
            .await
    }

    async fn try_request(&self, username: &str, email: &Email) -> Result<(), SubscriptionError> {
        let now = self.clock.now();

        let lookup = self
            .bounded("load subscription", self.store.find_by_email(email))
            .await?;
        let mut record = match lookup {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                let new = NewSubscription {
                    username: username.to_string(),
                    email: email.clone(),
                };
                let record = self
                    .bounded("create subscription", self.store.create(new, now))
                    .await?
                    .map_err(|e| self.store_failure("create subscription", e))?;
                tracing::info!(id = %record.id, "new subscription");
                return self.send_verification(record, now).await;
            }
            Err(e) => return Err(self.store_failure("load subscription", e)),
        };

        if record.refresh_banned_status(now) {
            tracing::info!(id = %record.id, "ban expired, attempts reset");
        }

        if let Err(reason) = record.check_verifiable(now, &self.params) {
            tracing::warn!(id = %record.id, ?reason, "verification request refused");
            return Err(reason.into());
        }

        if record.should_be_banned(&self.params) {
            record.ban(now, &self.params);
            let until = record.banned_until;
            self.persist(&record, now).await?;
            tracing::info!(
                id = %record.id,
                %until,
                duration = %format_duration(self.params.ban_duration_secs),
                "verification attempts exhausted, subscription banned"
            );
            return Err(SubscriptionError::Banned { until });
        }

        self.send_verification(record, now).await
    }

    async fn send_verification(
        &self,
        mut record: SubscriptionRecord,
        now: Timestamp,
    ) -> Result<(), SubscriptionError> {
        let code = self
            .codes
            .generate()
            .map_err(|e| self.crypto_failure("generate verification code", e.into()))?;
        let token = self
            .codec
            .issue(&record.id, &code, now)
            .map_err(|e| self.crypto_failure("issue verification token", e.into()))?;
        record.replace_verification_code(code);

        self.bounded(
            "send verification email",
            self.sender
                .send_verification(&record.email, &record.username, &token),
        )
        .await?
        .map_err(|e| {
            tracing::error!(id = %record.id, error = %e, "verification email not delivered");
            SubscriptionError::infra("send verification email")(InfraCause::Mail(e))
        })?;

        record.mark_verification_sent(now);
        let stored = self.persist(&record, now).await?;
        tracing::info!(
            id = %stored.id,
            attempts = stored.verification_attempts,
            "verification email sent"
        );
        Ok(())
    }

    async fn try_confirm(&self, id: &SubscriberId, code: &str) -> Result<(), SubscriptionError> {
        let now = self.clock.now();
        let mut record = match self
            .bounded("load subscription", self.store.find_by_id_and_code(id, code))
            .await?
        {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                tracing::warn!(%id, "verification code does not match any record");
                return Err(SubscriptionError::VerificationInvalid {
                    cause: VerificationFailure::NoMatchingRecord,
                });
            }
            Err(e) => return Err(self.store_failure("load subscription", e)),
        };

        record.mark_verified();
        self.persist(&record, now).await?;
        tracing::info!(%id, "subscription verified");
        Ok(())
    }

    async fn persist(
        &self,
        record: &SubscriptionRecord,
        now: Timestamp,
    ) -> Result<SubscriptionRecord, SubscriptionError> {
        self.bounded("persist subscription", self.store.update(record, now))
            .await?
            .map_err(|e| self.store_failure("persist subscription", e))
    }

    /// Run one collaborator call under the per-call timeout.
    async fn bounded<T, E>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<Result<T, E>, SubscriptionError> {
        let limit = Duration::from_millis(self.params.call_timeout_ms);
        tokio::time::timeout(limit, call).await.map_err(|_| {
            tracing::error!(operation, timeout_ms = self.params.call_timeout_ms, "call timed out");
            SubscriptionError::Timeout { operation }
        })
    }

    fn store_failure(&self, context: &'static str, e: StoreError) -> SubscriptionError {
        if e.is_conflict() || matches!(e, StoreError::Duplicate(_)) {
            tracing::debug!(error = %e, context, "write race");
        } else {
            tracing::error!(error = %e, context, "store call failed");
        }
        SubscriptionError::infra(context)(InfraCause::Store(e))
    }

    fn crypto_failure(&self, context: &'static str, cause: InfraCause) -> SubscriptionError {
        tracing::error!(error = %cause, context, "credential generation failed");
        SubscriptionError::infra(context)(cause)
    }
}
