use rand::rng;
use rand::seq::index;

use crate::error::AgentError;
use crate::transition::Transition;

/// Bounded experience store. A `Vec` arena plus a logical start index form
/// the ring: eviction overwrites the oldest slot in place and random reads
/// index the arena directly, so neither path chases pointers.
pub struct ReplayMemory {
    arena: Vec<Transition>,
    capacity: usize,
    start: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay capacity must be positive");
        Self {
            arena: Vec::with_capacity(capacity),
            capacity,
            start: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a transition, evicting the oldest one first when full.
    pub fn record(&mut self, transition: Transition) {
        if self.arena.len() < self.capacity {
            self.arena.push(transition);
        } else {
            self.arena[self.start] = transition;
            self.start = (self.start + 1) % self.capacity;
        }
    }

    /// The i-th stored transition in insertion order (0 = oldest).
    /// Callers guarantee `i < len`.
    fn get(&self, i: usize) -> &Transition {
        &self.arena[(self.start + i) % self.arena.len()]
    }

    /// Draws `n` distinct transitions uniformly at random. The store is
    /// left unchanged. Fails when fewer than `n` transitions are stored;
    /// it never partially returns.
    pub fn sample(&self, n: usize) -> Result<Vec<&Transition>, AgentError> {
        if self.arena.len() < n {
            return Err(AgentError::InsufficientData {
                requested: n,
                available: self.arena.len(),
            });
        }
        let mut rng = rng();
        Ok(index::sample(&mut rng, self.arena.len(), n)
            .iter()
            .map(|i| self.get(i))
            .collect())
    }

    /// Stored transitions in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        (0..self.arena.len()).map(|i| self.get(i))
    }
}
