// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default driver: greedy hill-climb over prompt mutations.

use std::time::Duration;

use anneal_core::{Driver, DriverError, EventSink, RunSpec};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::mutate::mutate_prompt;
use crate::objectives::{self, Objective};

const MUTATIONS_PER_ITERATION: usize = 3;

/// The built-in optimization driver.
///
/// Each iteration derives a handful of mutations of the current best
/// candidate, rescores them, keeps the winner, and emits one `progress`
/// event. The inter-iteration pause doubles as the cancellation yield
/// point required by the driver contract.
pub struct SearchDriver {
    pace: Duration,
}

impl SearchDriver {
    pub fn new() -> Self {
        Self {
            pace: Duration::from_millis(50),
        }
    }

    /// Override the inter-iteration pause (tests use a zero pace).
    pub fn with_pace(pace: Duration) -> Self {
        Self { pace }
    }
}

impl Default for SearchDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn scores_for(objectives: &[Objective], text: &str, examples: &[Value]) -> Map<String, Value> {
    let mut scores = Map::new();
    for objective in objectives {
        scores.insert(
            objective.name().to_string(),
            json!(objective.score(text, examples)),
        );
    }
    scores
}

fn total_score(objectives: &[Objective], text: &str, examples: &[Value]) -> f64 {
    objectives
        .iter()
        .map(|objective| objective.score(text, examples))
        .sum()
}

#[async_trait]
impl Driver for SearchDriver {
    async fn run(&self, sink: &dyn EventSink, spec: RunSpec) -> Result<(), DriverError> {
        sink.emit("started", json!({})).await?;

        let prompt = spec
            .payload
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let objective_names: Vec<String> = spec
            .payload
            .get("objectives")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| Objective::DEFAULT_NAMES.map(str::to_string).to_vec());
        let objectives = objectives::resolve(&objective_names);
        let examples: Vec<Value> = spec
            .payload
            .get("examples")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let seed = spec.payload.get("seed").and_then(Value::as_u64).unwrap_or(0);

        let mut best = prompt;
        let mut best_score = total_score(&objectives, &best, &examples);
        let mut lessons: Vec<String> = Vec::new();

        for iteration in 0..spec.iterations {
            if spec.deadline_exceeded() {
                sink.emit("failed", json!({"error": "deadline_exceeded"})).await?;
                return Ok(());
            }

            let candidates =
                mutate_prompt(&best, MUTATIONS_PER_ITERATION, seed.wrapping_add(iteration as u64));
            for candidate in candidates {
                let score = total_score(&objectives, &candidate, &examples);
                if score > best_score {
                    debug!(iteration, score, "kept improved candidate");
                    lessons.push(format!("iteration {}: kept improved mutation", iteration + 1));
                    best = candidate;
                    best_score = score;
                }
            }

            sink.emit(
                "progress",
                json!({
                    "iteration": iteration + 1,
                    "proposal": best,
                    "scores": scores_for(&objectives, &best, &examples),
                }),
            )
            .await?;

            // Yield point: lets cancellation land between iterations.
            tokio::time::sleep(self.pace).await;
        }

        if spec.deadline_exceeded() {
            sink.emit("failed", json!({"error": "deadline_exceeded"})).await?;
            return Ok(());
        }

        sink.emit(
            "finished",
            json!({
                "proposal": best,
                "lessons": lessons,
                "scores": scores_for(&objectives, &best, &examples),
            }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
