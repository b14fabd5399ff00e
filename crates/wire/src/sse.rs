// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-stream framing.
//!
//! A frame is three lines (`id:`, `event:`, `data:` carrying the full
//! JSON envelope) terminated by a blank line. Keep-alives are a single
//! comment line. The prelude advertises the client reconnect delay.

use anneal_core::EventEnvelope;

/// Stream prelude: the reconnect delay hint, in milliseconds.
pub fn retry_prelude(ms: u64) -> String {
    format!("retry: {ms}\n\n")
}

/// Keep-alive comment frame.
pub fn keep_alive() -> &'static str {
    ":\n\n"
}

/// Frame one envelope for the wire. Byte-stable for a fixed envelope.
pub fn frame(envelope: &EventEnvelope) -> Result<String, serde_json::Error> {
    Ok(format!(
        "id: {}\nevent: {}\ndata: {}\n\n",
        envelope.id,
        envelope.event_type,
        envelope.to_json()?
    ))
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
