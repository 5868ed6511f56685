// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Abuse patterns for security testing.

use std::collections::HashMap;

/// Abuse pattern configuration.
#[derive(Debug, Clone)]
pub struct AbuseScenario {
    /// Total number of submissions to send
    pub total_submissions: usize,
    /// Number of unique clients to simulate
    pub unique_clients: usize,
    /// Every n-th submission carries an invalid payload (None = all valid)
    pub invalid_every: Option<usize>,
    /// Whether the notification channel rejects every message
    pub channel_down: bool,
}

impl Default for AbuseScenario {
    fn default() -> Self {
        Self {
            total_submissions: 20,
            unique_clients: 1,
            invalid_every: None,
            channel_down: false,
        }
    }
}

/// Predefined abuse patterns.
impl AbuseScenario {
    /// Single client flood - one visitor hammering the form.
    pub fn single_client_flood() -> Self {
        Self {
            total_submissions: 50,
            unique_clients: 1,
            ..Default::default()
        }
    }

    /// Many visitors, each well under quota.
    pub fn distributed_visitors() -> Self {
        Self {
            total_submissions: 200,
            unique_clients: 100,
            ..Default::default()
        }
    }

    /// Distributed flood - several clients each exceeding quota.
    pub fn distributed_flood() -> Self {
        Self {
            total_submissions: 120,
            unique_clients: 8,
            ..Default::default()
        }
    }

    /// Garbage payloads - every submission fails validation.
    pub fn invalid_payload_spam() -> Self {
        Self {
            total_submissions: 100,
            unique_clients: 1,
            invalid_every: Some(1),
            ..Default::default()
        }
    }

    /// Mixed garbage and valid submissions from a few clients.
    pub fn mixed_garbage() -> Self {
        Self {
            total_submissions: 60,
            unique_clients: 3,
            invalid_every: Some(2),
            ..Default::default()
        }
    }

    /// Mail relay outage while visitors keep submitting.
    pub fn channel_outage() -> Self {
        Self {
            total_submissions: 16,
            unique_clients: 2,
            channel_down: true,
            ..Default::default()
        }
    }

    /// Whether submission `i` carries an invalid payload.
    pub fn is_invalid(&self, i: usize) -> bool {
        self.invalid_every.is_some_and(|n| i % n == 0)
    }

    /// Exact outcome counts for a fixed window of `max_per_window` that
    /// does not expire during the run.
    pub fn expected(&self, max_per_window: usize) -> ExpectedOutcomes {
        let mut valid_per_client: HashMap<usize, usize> = HashMap::new();
        let mut invalid = 0;
        for i in 0..self.total_submissions {
            if self.is_invalid(i) {
                invalid += 1;
            } else {
                *valid_per_client.entry(i % self.unique_clients).or_insert(0) += 1;
            }
        }

        let admitted: usize = valid_per_client
            .values()
            .map(|&v| v.min(max_per_window))
            .sum();
        let valid: usize = valid_per_client.values().sum();

        ExpectedOutcomes {
            accepted: if self.channel_down { 0 } else { admitted },
            validation_failed: invalid,
            rate_limited: valid - admitted,
            dispatch_failed: if self.channel_down { admitted } else { 0 },
        }
    }
}

/// Expected outcome counts for a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedOutcomes {
    pub accepted: usize,
    pub validation_failed: usize,
    pub rate_limited: usize,
    pub dispatch_failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flood_expectations() {
        let expected = AbuseScenario::single_client_flood().expected(5);
        assert_eq!(
            expected,
            ExpectedOutcomes {
                accepted: 5,
                validation_failed: 0,
                rate_limited: 45,
                dispatch_failed: 0,
            }
        );
    }

    #[test]
    fn test_mixed_garbage_expectations() {
        // 30 invalid, 30 valid spread over 3 clients: 10 valid each
        let expected = AbuseScenario::mixed_garbage().expected(5);
        assert_eq!(expected.validation_failed, 30);
        assert_eq!(expected.accepted, 15);
        assert_eq!(expected.rate_limited, 15);
    }
}
