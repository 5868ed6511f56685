// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! This crate relays contact form submissions from the portfolio site to the
//! site owner's inbox:
//!
//! - Per-field validation (name, email, message) with all errors reported
//! - Email normalization (case folding, provider alias canonicalization)
//! - HTML escaping of user text in the rendered notification
//! - Per-client fixed-window rate limiting (5 per 15 minutes default)
//! - Single, time-bounded SMTP dispatch per accepted submission

pub mod config;
pub mod contact;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod notifier;
pub mod validator;

pub use config::Config;
pub use contact::{ContactError, ContactService, ContactServiceConfig};
pub use limiter::{ClientId, RateLimitResult, RateLimitStore, RateLimiter};
pub use notifier::{NotificationMessage, Notifier, NotifyError, SmtpNotifier};
pub use validator::{ContactPayload, ContactValidator, ValidationError, ValidationResult};
