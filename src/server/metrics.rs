//! Process-wide counters.
//!
//! Deliberately minimal: plain counters, one gauge for connections in
//! flight, and label→count maps for classified errors. Exposition is
//! somebody else's job; everything here is readable through
//! [`Metrics::global`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, value: u64) {
        self.0.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct Gauge(AtomicI64);

impl Gauge {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Increments now, decrements when the handle drops.
    pub fn track_in_progress(&'static self) -> InProgressHandle {
        self.inc();
        InProgressHandle { gauge: self }
    }
}

pub struct InProgressHandle {
    gauge: &'static Gauge,
}

impl Drop for InProgressHandle {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// A counter keyed by a free-form label, used for error classes where the
/// label is the error message.
#[derive(Debug, Default)]
pub struct LabeledCounter(Mutex<HashMap<String, u64>>);

impl LabeledCounter {
    pub fn inc(&self, label: &str) {
        let mut counts = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *counts.entry(label.to_owned()).or_insert(0) += 1;
    }

    pub fn get(&self, label: &str) -> u64 {
        let counts = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        counts.get(label).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct Metrics {
    pub conn_accepted: Counter,
    pub conn_active: Gauge,
    pub reqs_total: Counter,
    pub resp_total: Counter,
    pub resp_bytes: Counter,
    pub accept_errors: LabeledCounter,
    pub recv_errors: LabeledCounter,
    pub send_errors: LabeledCounter,
    pub req_errors: LabeledCounter,
}

impl Metrics {
    pub fn global() -> &'static Metrics {
        static METRICS: OnceLock<Metrics> = OnceLock::new();
        METRICS.get_or_init(Metrics::default)
    }
}
