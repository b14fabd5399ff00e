// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide counters and their Prometheus exposition.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::{json, Value};

#[derive(Debug, Default)]
pub struct Metrics {
    pub jobs_created: AtomicU64,
    pub jobs_finished: AtomicU64,
    pub jobs_failed: AtomicU64,
    pub jobs_cancelled: AtomicU64,
    pub rate_limited: AtomicU64,
    pub oversize_rejected: AtomicU64,
    /// Connected event-stream subscribers; a gauge via +/- increments.
    sse_clients: AtomicI64,
    /// (method, path, status) → count.
    requests: Mutex<BTreeMap<(String, String, u16), u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_connected(&self) {
        self.sse_clients.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_disconnected(&self) {
        self.sse_clients.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn sse_clients(&self) -> i64 {
        self.sse_clients.load(Ordering::Relaxed)
    }

    pub fn record_request(&self, method: &str, path: &str, status: u16) {
        let mut requests = self.requests.lock();
        *requests
            .entry((method.to_string(), path.to_string(), status))
            .or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> Value {
        json!({
            "jobs_created": self.jobs_created.load(Ordering::Relaxed),
            "jobs_finished": self.jobs_finished.load(Ordering::Relaxed),
            "jobs_failed": self.jobs_failed.load(Ordering::Relaxed),
            "jobs_cancelled": self.jobs_cancelled.load(Ordering::Relaxed),
            "rate_limited": self.rate_limited.load(Ordering::Relaxed),
            "oversize_rejected": self.oversize_rejected.load(Ordering::Relaxed),
            "sse_clients": self.sse_clients.load(Ordering::Relaxed),
        })
    }

    /// Prometheus text exposition.
    pub fn prometheus(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push("# HELP http_requests_total Total HTTP requests.".to_string());
        lines.push("# TYPE http_requests_total counter".to_string());
        for ((method, path, status), count) in self.requests.lock().iter() {
            lines.push(format!(
                "http_requests_total{{method=\"{method}\",path=\"{path}\",status=\"{status}\"}} {count}"
            ));
        }

        lines.push("# HELP sse_clients Number of connected event-stream clients.".to_string());
        lines.push("# TYPE sse_clients gauge".to_string());
        lines.push(format!("sse_clients {}", self.sse_clients.load(Ordering::Relaxed)));

        for (name, counter) in [
            ("jobs_created", &self.jobs_created),
            ("jobs_finished", &self.jobs_finished),
            ("jobs_failed", &self.jobs_failed),
            ("jobs_cancelled", &self.jobs_cancelled),
            ("rate_limited", &self.rate_limited),
            ("oversize_rejected", &self.oversize_rejected),
        ] {
            lines.push(format!("# TYPE {name}_total counter"));
            lines.push(format!("{name}_total {}", counter.load(Ordering::Relaxed)));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
