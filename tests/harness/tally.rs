// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome collection for abuse simulation results.

use contact_relay::{contact::ContactError, limiter::ClientId, metrics::Outcome};
use std::collections::HashMap;

/// Collects submission outcomes during a simulation.
#[derive(Debug, Default)]
pub struct OutcomeTally {
    /// Count of submissions by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Accepted submissions by client
    accepted_per_client: HashMap<ClientId, usize>,
    /// Submissions by client, any outcome
    requests_per_client: HashMap<ClientId, usize>,
}

impl OutcomeTally {
    /// Create a new tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of one submission.
    pub fn record(&mut self, client: &ClientId, result: &Result<(), ContactError>) {
        let outcome = match result {
            Ok(()) => Outcome::Accepted,
            Err(err) => err.outcome(),
        };
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.requests_per_client.entry(client.clone()).or_insert(0) += 1;
        if outcome == Outcome::Accepted {
            *self.accepted_per_client.entry(client.clone()).or_insert(0) += 1;
        }
    }

    /// Get total submission count.
    pub fn total(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Most submissions accepted for any single client.
    pub fn max_accepted_per_client(&self) -> usize {
        self.accepted_per_client.values().copied().max().unwrap_or(0)
    }

    /// Number of clients that submitted at all.
    pub fn unique_clients(&self) -> usize {
        self.requests_per_client.len()
    }

    /// Get block rate (ratio of rejected to total).
    pub fn block_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (total - self.count(Outcome::Accepted)) as f64 / total as f64
    }
}

impl std::fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Submission Outcomes ===")?;
        writeln!(f, "Total:             {}", self.total())?;
        for outcome in [
            Outcome::Accepted,
            Outcome::ValidationFailed,
            Outcome::RateLimited,
            Outcome::DispatchFailed,
        ] {
            writeln!(f, "{:<19}{}", format!("{outcome}:"), self.count(outcome))?;
        }
        writeln!(f, "Unique clients:    {}", self.unique_clients())?;
        writeln!(f, "Block rate:        {:.1}%", self.block_rate() * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_tally_collection() {
        let mut tally = OutcomeTally::new();
        let client = ClientId::new("10.0.0.1");

        tally.record(&client, &Ok(()));
        tally.record(&client, &Ok(()));
        tally.record(
            &client,
            &Err(ContactError::RateLimited {
                retry_after: Duration::from_secs(60),
            }),
        );

        assert_eq!(tally.total(), 3);
        assert_eq!(tally.count(Outcome::Accepted), 2);
        assert_eq!(tally.count(Outcome::RateLimited), 1);
        assert_eq!(tally.max_accepted_per_client(), 2);
        assert_eq!(tally.unique_clients(), 1);
        assert!((tally.block_rate() - 1.0 / 3.0).abs() < 0.01);
    }
}
