// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for contact submissions.
//!
//! Each client gets a window of `window_secs` in which at most
//! `max_requests_per_window` submissions are admitted. Windows live in a
//! shared table; each entry carries its own mutex so check-and-increment is
//! atomic per client without serializing unrelated clients.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until the current window expires
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Opaque identity used to attribute rate limit state to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<IpAddr> for ClientId {
    fn from(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage for per-client submission quotas.
///
/// Implementations must make `check_and_increment` atomic per client: two
/// concurrent calls for the same client never both observe the last free slot.
pub trait RateLimitStore: Send + Sync + 'static {
    fn check_and_increment(
        &self,
        client: &ClientId,
    ) -> impl Future<Output = RateLimitResult> + Send;
}

/// Counter for one client's current window.
#[derive(Debug)]
struct Window {
    /// When the current window began
    started: Instant,
    /// Submissions admitted in the current window
    count: u32,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            started: now,
            count: 0,
        }
    }

    fn is_expired(&self, now: Instant, length: Duration) -> bool {
        now.duration_since(self.started) >= length
    }
}

/// In-memory fixed-window rate limiter.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Per-client windows
    windows: RwLock<HashMap<ClientId, Arc<Mutex<Window>>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Admit the request if the client's window has room, counting it.
    pub async fn check(&self, client: &ClientId) -> RateLimitResult {
        let slot = self.slot(client).await;
        let mut window = slot.lock().await;

        let now = Instant::now();
        let length = self.config.window_duration();
        let max = self.config.max_requests_per_window;

        if window.is_expired(now, length) {
            *window = Window::new(now);
        }
        let reset_in = length.saturating_sub(now.duration_since(window.started));

        if window.count < max {
            window.count += 1;
            RateLimitResult::Allowed {
                remaining: max - window.count,
                reset_in,
            }
        } else {
            debug!(%client, count = window.count, ?reset_in, "Client rate limit exceeded");
            RateLimitResult::Limited {
                retry_after: reset_in,
            }
        }
    }

    /// Submissions counted against the client's current window, if any.
    pub async fn usage(&self, client: &ClientId) -> Option<u32> {
        let slot = Arc::clone(self.windows.read().await.get(client)?);
        let window = slot.lock().await;
        if window.is_expired(Instant::now(), self.config.window_duration()) {
            None
        } else {
            Some(window.count)
        }
    }

    /// Number of clients with a tracked window.
    pub async fn tracked_clients(&self) -> usize {
        self.windows.read().await.len()
    }

    /// Clean up expired entries (should be called periodically).
    ///
    /// Windows held by an in-flight check are kept even when expired.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let length = self.config.window_duration();

        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(window) => !window.is_expired(now, length),
                Err(_) => true,
            }
        });

        let evicted = before - windows.len();
        if evicted > 0 {
            debug!(evicted, remaining = windows.len(), "Evicted expired rate limit windows");
        }
    }

    async fn slot(&self, client: &ClientId) -> Arc<Mutex<Window>> {
        if let Some(slot) = self.windows.read().await.get(client) {
            return Arc::clone(slot);
        }

        let mut windows = self.windows.write().await;
        let slot = windows
            .entry(client.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Window::new(Instant::now()))));
        Arc::clone(slot)
    }
}

impl RateLimitStore for RateLimiter {
    async fn check_and_increment(&self, client: &ClientId) -> RateLimitResult {
        self.check(client).await
    }
}
