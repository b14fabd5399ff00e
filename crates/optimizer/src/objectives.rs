// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate-ranking objectives.

use serde_json::Value;

/// A deterministic text objective. Higher is better for all variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Negative character count; rewards shorter candidates.
    Brevity,
    /// Unique-token ratio.
    Diversity,
    /// Token overlap with the example inputs.
    Coverage,
}

impl Objective {
    pub const DEFAULT_NAMES: [&'static str; 3] = ["brevity", "diversity", "coverage"];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "brevity" => Some(Objective::Brevity),
            "diversity" => Some(Objective::Diversity),
            "coverage" => Some(Objective::Coverage),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Objective::Brevity => "brevity",
            Objective::Diversity => "diversity",
            Objective::Coverage => "coverage",
        }
    }

    pub fn score(&self, text: &str, examples: &[Value]) -> f64 {
        match self {
            Objective::Brevity => -(text.len() as f64),
            Objective::Diversity => diversity(text),
            Objective::Coverage => coverage(text, examples),
        }
    }
}

fn diversity(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let unique: std::collections::HashSet<&str> = tokens.iter().copied().collect();
    unique.len() as f64 / tokens.len() as f64
}

fn coverage(text: &str, examples: &[Value]) -> f64 {
    let mut example_tokens = std::collections::HashSet::new();
    for example in examples {
        if let Some(input) = example.get("input").and_then(Value::as_str) {
            let lowered = input.to_lowercase();
            for token in lowered.split_whitespace() {
                example_tokens.insert(token.to_string());
            }
        }
    }
    if example_tokens.is_empty() {
        return 0.0;
    }
    let lowered = text.to_lowercase();
    let text_tokens: std::collections::HashSet<&str> = lowered.split_whitespace().collect();
    let overlap = example_tokens
        .iter()
        .filter(|token| text_tokens.contains(token.as_str()))
        .count();
    overlap as f64 / example_tokens.len() as f64
}

/// Resolve objective names, silently dropping unknown ones.
pub(crate) fn resolve(names: &[String]) -> Vec<Objective> {
    names.iter().filter_map(|name| Objective::parse(name)).collect()
}

#[cfg(test)]
#[path = "objectives_tests.rs"]
mod tests;
