// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for contact submissions.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Terminal outcome of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Accepted,
    ValidationFailed,
    RateLimited,
    DispatchFailed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::ValidationFailed => "validation_failed",
            Self::RateLimited => "rate_limited",
            Self::DispatchFailed => "dispatch_failed",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics owned by a single service instance.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    dispatch_duration: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_submissions_total",
                "Contact submissions by terminal outcome",
            ),
            &["outcome"],
        )?;
        let dispatch_duration = Histogram::with_opts(
            HistogramOpts::new(
                "contact_dispatch_duration_seconds",
                "Time spent delivering contact notifications",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(dispatch_duration.clone()))?;

        Ok(Self {
            registry,
            submissions,
            dispatch_duration,
        })
    }

    pub fn record(&self, outcome: Outcome) {
        self.submissions
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    pub fn observe_dispatch(&self, elapsed: Duration) {
        self.dispatch_duration.observe(elapsed.as_secs_f64());
    }

    /// Count recorded for `outcome` so far.
    pub fn submissions(&self, outcome: Outcome) -> u64 {
        self.submissions
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_duration.get_sample_count()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
