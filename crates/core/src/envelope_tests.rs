// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

fn envelope(event_type: &str) -> EventEnvelope {
    EventEnvelope::new(event_type, JobId::from_string("job-1"), 12.5, 3, json!({"k": "v"}))
}

#[test]
fn field_order_is_canonical() {
    let json = envelope("progress").to_json().unwrap();
    assert_eq!(
        json,
        r#"{"type":"progress","schema_version":1,"job_id":"job-1","ts":12.5,"id":3,"data":{"k":"v"}}"#
    );
}

#[test]
fn serialization_is_byte_stable() {
    let env = envelope("started");
    assert_eq!(env.to_json().unwrap(), env.to_json().unwrap());

    let clone = env.clone();
    assert_eq!(env.to_json().unwrap(), clone.to_json().unwrap());
}

#[test]
fn round_trip_preserves_envelope() {
    let env = envelope("mutation");
    let parsed: EventEnvelope = serde_json::from_str(&env.to_json().unwrap()).unwrap();
    assert_eq!(parsed, env);
}

#[parameterized(
    finished = { "finished", true },
    failed = { "failed", true },
    cancelled = { "cancelled", true },
    shutdown = { "shutdown", true },
    started = { "started", false },
    progress = { "progress", false },
    custom = { "early_stop", false },
)]
fn terminal_set(event_type: &str, terminal: bool) {
    assert_eq!(is_terminal(event_type), terminal);
    assert_eq!(envelope(event_type).is_terminal(), terminal);
}

#[test]
fn driver_defined_subtypes_survive_verbatim() {
    let env = envelope("tournament_round");
    let parsed: EventEnvelope = serde_json::from_str(&env.to_json().unwrap()).unwrap();
    assert_eq!(parsed.event_type, "tournament_round");
}
