// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt mutation operators.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn swap_words(text: &str, rng: &mut StdRng) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return text.to_string();
    }
    let mut indices: Vec<usize> = (0..words.len()).collect();
    indices.shuffle(rng);
    words.swap(indices[0], indices[1]);
    words.join(" ")
}

fn drop_word(text: &str, rng: &mut StdRng) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return text.to_string();
    }
    let idx = rng.gen_range(0..words.len());
    words
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, w)| *w)
        .collect::<Vec<_>>()
        .join(" ")
}

fn reverse(text: &str, _rng: &mut StdRng) -> String {
    text.split_whitespace().rev().collect::<Vec<_>>().join(" ")
}

const OPERATORS: [fn(&str, &mut StdRng) -> String; 3] = [swap_words, drop_word, reverse];

/// Derive up to `k` distinct mutations of `base`. Deterministic for a
/// fixed `(base, k, seed)`; empty or duplicate mutations are skipped.
pub fn mutate_prompt(base: &str, k: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out: Vec<String> = Vec::new();
    for i in 0..k {
        let op = OPERATORS[i % OPERATORS.len()];
        let mutated = op(base, &mut rng);
        if !mutated.is_empty() && mutated != base && !out.contains(&mutated) {
            out.push(mutated);
        }
    }
    out
}

#[cfg(test)]
#[path = "mutate_tests.rs"]
mod tests;
