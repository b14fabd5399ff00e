// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream reader: replay-then-live event delivery for one subscriber.
//!
//! Replays missed events from the store, then follows the job's channel
//! until a terminal event, emitting keep-alive comments while idle. A
//! reconnecting client passes its last seen id and receives only the
//! events after it.

use std::sync::Arc;

use anneal_core::EventEnvelope;
use anneal_storage::JobStore;
use anneal_wire::{frame, keep_alive, retry_prelude};
use tokio::sync::mpsc;
use tracing::warn;

use crate::config::Settings;
use crate::metrics::Metrics;
use crate::registry::JobEntry;

/// Serve one subscriber, writing framed events into `out` until the
/// stream ends (terminal event, disconnect, or dead job).
pub async fn run_stream(
    job_id: String,
    last_id: u64,
    entry: Option<Arc<JobEntry>>,
    store: Arc<dyn JobStore>,
    settings: Arc<Settings>,
    metrics: Arc<Metrics>,
    out: mpsc::Sender<String>,
) {
    metrics.client_connected();
    serve_subscriber(job_id, last_id, entry, store, settings, out).await;
    metrics.client_disconnected();
}

async fn serve_subscriber(
    job_id: String,
    last_id: u64,
    entry: Option<Arc<JobEntry>>,
    store: Arc<dyn JobStore>,
    settings: Arc<Settings>,
    out: mpsc::Sender<String>,
) {
    if out.send(retry_prelude(settings.sse_retry_ms)).await.is_err() {
        return;
    }

    // Replay what the subscriber missed.
    let mut cursor = last_id;
    match store.events_since(&job_id, last_id).await {
        Ok(replay) => {
            for envelope in replay {
                cursor = cursor.max(envelope.id);
                let terminal = envelope.is_terminal();
                if !forward(&out, &envelope).await {
                    return;
                }
                if terminal {
                    return;
                }
            }
        }
        Err(err) => warn!(%job_id, error = %err, "event replay failed"),
    }

    // Not live anymore (reaped or deleted): the replayed prefix is all
    // there is.
    let Some(entry) = entry else {
        return;
    };
    // The channel has a single consumer; an overlapping reader gets the
    // replay only.
    let Some(rx) = entry.take_receiver().await else {
        return;
    };
    let rx = follow_live(rx, cursor, &settings, &out).await;
    entry.return_receiver(rx).await;
}

async fn forward(out: &mpsc::Sender<String>, envelope: &EventEnvelope) -> bool {
    match frame(envelope) {
        Ok(text) => out.send(text).await.is_ok(),
        Err(err) => {
            warn!(error = %err, "failed to frame event");
            true
        }
    }
}

async fn follow_live(
    mut rx: mpsc::Receiver<EventEnvelope>,
    mut cursor: u64,
    settings: &Settings,
    out: &mpsc::Sender<String>,
) -> mpsc::Receiver<EventEnvelope> {
    loop {
        match tokio::time::timeout(settings.sse_ping_interval, rx.recv()).await {
            Ok(Some(envelope)) => {
                // Duplicate of a replayed event; drop it.
                if envelope.id <= cursor {
                    continue;
                }
                cursor = envelope.id;
                let terminal = envelope.is_terminal();
                if !forward(out, &envelope).await {
                    break;
                }
                if terminal {
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => {
                if out.send(keep_alive().to_string()).await.is_err() {
                    break;
                }
            }
        }
    }
    rx
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
