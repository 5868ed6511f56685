// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact submission service.
//!
//! `submit` runs a submission through validation, the per-client rate limit
//! and a single bounded dispatch attempt. Validation failures never touch the
//! limiter; rate limited submissions never reach the notifier. An admitted
//! submission is always dispatched, even if the caller stops waiting.

use crate::limiter::{ClientId, RateLimitResult, RateLimitStore, RateLimiter};
use crate::metrics::{Metrics, Outcome};
use crate::notifier::{NotificationMessage, Notifier, NotifyError};
use crate::validator::{
    ContactPayload, ContactSubmission, ContactValidator, ValidationError, ValidationResult,
};
use lettre::message::Mailbox;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info};

/// Why a submission was not accepted.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Validation failed: {}", field_list(.0))]
    ValidationFailed(Vec<ValidationError>),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Failed to dispatch notification: {0}")]
    DispatchFailed(#[source] NotifyError),
}

impl ContactError {
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::ValidationFailed(_) => Outcome::ValidationFailed,
            Self::RateLimited { .. } => Outcome::RateLimited,
            Self::DispatchFailed(_) => Outcome::DispatchFailed,
        }
    }
}

fn field_list(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::field)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Service settings that are not owned by a collaborator.
#[derive(Debug, Clone)]
pub struct ContactServiceConfig {
    /// Mailbox that receives contact notifications
    pub recipient: Mailbox,
    /// Upper bound on a single dispatch attempt
    pub dispatch_timeout: Duration,
}

pub struct ContactService<N, L = RateLimiter> {
    validator: ContactValidator,
    limiter: L,
    notifier: Arc<N>,
    config: ContactServiceConfig,
    metrics: Metrics,
}

impl<N, L> ContactService<N, L>
where
    N: Notifier,
    L: RateLimitStore,
{
    pub fn new(
        validator: ContactValidator,
        limiter: L,
        notifier: N,
        config: ContactServiceConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            validator,
            limiter,
            notifier: Arc::new(notifier),
            config,
            metrics,
        }
    }

    pub fn limiter(&self) -> &L {
        &self.limiter
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Validate, rate limit and dispatch one submission from `client`.
    ///
    /// Once a submission is admitted its dispatch runs on its own task, so
    /// dropping the returned future does not cancel the send.
    pub async fn submit(
        &self,
        payload: &ContactPayload,
        client: &ClientId,
    ) -> Result<(), ContactError> {
        let submission = match self.admit(payload, client).await {
            Ok(submission) => submission,
            Err(err) => {
                self.metrics.record(err.outcome());
                return Err(err);
            }
        };

        let message =
            NotificationMessage::from_submission(&submission, self.config.recipient.clone());
        let task = tokio::spawn(dispatch(
            Arc::clone(&self.notifier),
            message,
            self.config.dispatch_timeout,
            self.metrics.clone(),
            client.clone(),
        ));

        match task.await {
            Ok(result) => result.map_err(ContactError::DispatchFailed),
            Err(err) => {
                error!(%client, error = %err, "Dispatch task did not complete");
                self.metrics.record(Outcome::DispatchFailed);
                Err(ContactError::DispatchFailed(NotifyError::Task(err)))
            }
        }
    }

    /// Validation and rate limiting; everything that happens before dispatch.
    async fn admit(
        &self,
        payload: &ContactPayload,
        client: &ClientId,
    ) -> Result<ContactSubmission, ContactError> {
        let submission = match self.validator.validate(payload) {
            ValidationResult::Valid(submission) => submission,
            ValidationResult::Invalid(errors) => {
                info!(%client, fields = %field_list(&errors), "Submission failed validation");
                return Err(ContactError::ValidationFailed(errors));
            }
        };

        if let RateLimitResult::Limited { retry_after } =
            self.limiter.check_and_increment(client).await
        {
            info!(
                %client,
                retry_after_secs = retry_after.as_secs(),
                "Submission rate limited"
            );
            return Err(ContactError::RateLimited { retry_after });
        }

        Ok(submission)
    }
}

/// One bounded send attempt. Logs and records its own outcome so the result
/// is accounted for even when nobody is waiting on it.
async fn dispatch<N: Notifier>(
    notifier: Arc<N>,
    message: NotificationMessage,
    timeout: Duration,
    metrics: Metrics,
    client: ClientId,
) -> Result<(), NotifyError> {
    let started = Instant::now();
    let sent = tokio::time::timeout(timeout, notifier.send(&message))
        .await
        .unwrap_or_else(|_| Err(NotifyError::Timeout(timeout)));
    metrics.observe_dispatch(started.elapsed());

    match &sent {
        Ok(()) => {
            info!(%client, reply_to = %message.reply_to.email, "Contact message dispatched");
            metrics.record(Outcome::Accepted);
        }
        Err(err) => {
            error!(%client, error = %err, "Failed to dispatch contact message");
            metrics.record(Outcome::DispatchFailed);
        }
    }
    sent
}
