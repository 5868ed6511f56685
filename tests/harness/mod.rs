// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for contact relay abuse simulation.
//!
//! Provides fake notification channels, payload and client generators, and
//! outcome tallies shared by the integration and security tests.

#![allow(dead_code)]

pub mod fakes;
pub mod generators;
pub mod scenarios;
pub mod tally;

use contact_relay::{
    config::{RateLimitConfig, ValidationConfig},
    contact::{ContactService, ContactServiceConfig},
    limiter::RateLimiter,
    metrics::Metrics,
    notifier::Notifier,
    validator::ContactValidator,
};
use std::time::Duration;

/// Build a service around `notifier` with the given quota.
pub fn service_with<N: Notifier>(notifier: N, max: u32, window_secs: u64) -> ContactService<N> {
    ContactService::new(
        ContactValidator::new(ValidationConfig::default()),
        RateLimiter::new(RateLimitConfig {
            max_requests_per_window: max,
            window_secs,
            ..Default::default()
        }),
        notifier,
        ContactServiceConfig {
            recipient: "owner@example.com".parse().unwrap(),
            dispatch_timeout: Duration::from_secs(5),
        },
        Metrics::new().unwrap(),
    )
}
