// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Deterministic notification channels for tests.

use contact_relay::notifier::{NotificationMessage, Notifier, NotifyError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Records every delivery attempt; fails while switched to failing mode.
#[derive(Debug, Default)]
pub struct FakeNotifier {
    failing: AtomicBool,
    attempts: AtomicUsize,
    delay: Option<Duration>,
    sent: Mutex<Vec<NotificationMessage>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel that rejects every message until switched back.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    /// A channel that takes `delay` to deliver each message.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of delivery attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Messages delivered successfully.
    pub fn sent(&self) -> Vec<NotificationMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for FakeNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected("454 temporary authentication failure".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
