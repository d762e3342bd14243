//! Option shuffling
//!
//! Each stage visit gets one permutation of the stage's options. The
//! permutation is cached under `(session, stage)` and reused for every view
//! and every retry during that visit; leaving the stage or resetting the
//! case drops it, so the next visit draws a fresh order.

use casesim_core::Stage;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::session::SessionId;

/// Display order of one stage visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleMapping {
    /// Options in the order they are shown
    pub display_options: Vec<String>,
    /// Position of the canonical correct option within `display_options`
    pub display_correct_index: usize,
    /// `order[d]` is the canonical index shown at display position `d`
    pub order: Vec<usize>,
}

impl ShuffleMapping {
    /// Build a mapping from a permutation of `0..stage.options.len()`.
    ///
    /// Returns `None` unless every canonical index appears exactly once.
    /// The correct position is tracked by canonical index, never by text.
    pub fn from_order(stage: &Stage, order: Vec<usize>) -> Option<Self> {
        let len = stage.options.len();
        if order.len() != len {
            return None;
        }
        let mut seen = vec![false; len];
        for &i in &order {
            if i >= len || std::mem::replace(&mut seen[i], true) {
                return None;
            }
        }

        let display_options = order.iter().map(|&i| stage.options[i].clone()).collect();
        let display_correct_index = order.iter().position(|&i| i == stage.correct_index)?;

        Some(Self {
            display_options,
            display_correct_index,
            order,
        })
    }

    /// Canonical order, shuffling disabled
    pub fn identity(stage: &Stage) -> Self {
        Self {
            display_options: stage.options.clone(),
            display_correct_index: stage.correct_index,
            order: (0..stage.options.len()).collect(),
        }
    }

    /// Mapping for `order`, or the canonical order when `order` is not a
    /// permutation of the stage's options.
    pub fn from_order_or_identity(stage: &Stage, order: Vec<usize>) -> Self {
        Self::from_order(stage, order).unwrap_or_else(|| {
            tracing::warn!(
                options = stage.options.len(),
                "display order is not a permutation of the options, keeping canonical order"
            );
            Self::identity(stage)
        })
    }

    /// Display index of the option with exactly this text.
    pub fn resolve(&self, text: &str) -> Option<usize> {
        self.display_options.iter().position(|o| o == text)
    }

    /// Canonical index of the option shown at `display_index`.
    pub fn canonical_index(&self, display_index: usize) -> Option<usize> {
        self.order.get(display_index).copied()
    }

    pub fn is_correct(&self, display_index: usize) -> bool {
        display_index == self.display_correct_index
    }

    pub fn correct_text(&self) -> &str {
        self.display_options
            .get(self.display_correct_index)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.display_options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.display_options.is_empty()
    }
}

/// Produces the display order for a stage visit
pub trait OptionShuffler: Send {
    /// Shuffler name used in logs
    fn name(&self) -> &'static str;

    /// Canonical option indices in display order. The engine only accepts
    /// a permutation of `0..stage.options.len()`.
    fn shuffle(&mut self, stage: &Stage) -> Vec<usize>;
}

/// Uniform random permutation (Fisher-Yates)
pub struct UniformShuffler {
    rng: StdRng,
}

impl UniformShuffler {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create with a specific seed for reproducible orders
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for UniformShuffler {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionShuffler for UniformShuffler {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn shuffle(&mut self, stage: &Stage) -> Vec<usize> {
        let mut order: Vec<usize> = (0..stage.options.len()).collect();
        order.shuffle(&mut self.rng);
        order
    }
}

/// Keeps the canonical order
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityShuffler;

impl OptionShuffler for IdentityShuffler {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn shuffle(&mut self, stage: &Stage) -> Vec<usize> {
        (0..stage.options.len()).collect()
    }
}

/// Cache key for one stage of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShuffleKey {
    pub session: SessionId,
    pub stage_index: usize,
}

impl ShuffleKey {
    pub fn new(session: SessionId, stage_index: usize) -> Self {
        Self {
            session,
            stage_index,
        }
    }
}

/// Mappings of the stages currently being visited
#[derive(Debug, Default, Clone)]
pub struct ShuffleCache {
    mappings: HashMap<ShuffleKey, ShuffleMapping>,
}

impl ShuffleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ShuffleKey) -> Option<&ShuffleMapping> {
        self.mappings.get(key)
    }

    /// Return the cached mapping, producing it with `make` only if absent.
    pub fn get_or_insert_with<F>(&mut self, key: ShuffleKey, make: F) -> &ShuffleMapping
    where
        F: FnOnce() -> ShuffleMapping,
    {
        self.mappings.entry(key).or_insert_with(make)
    }

    pub fn contains(&self, key: &ShuffleKey) -> bool {
        self.mappings.contains_key(key)
    }

    pub fn invalidate(&mut self, key: &ShuffleKey) -> Option<ShuffleMapping> {
        self.mappings.remove(key)
    }

    /// Drop every mapping that belongs to `session`.
    pub fn clear_session(&mut self, session: SessionId) {
        self.mappings.retain(|key, _| key.session != session);
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
