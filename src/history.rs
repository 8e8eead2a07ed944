//! Round history
//!
//! In-memory only, keeps the most recent `MAX_ROUND_HISTORY` rounds.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_ROUND_HISTORY;
use crate::sim::TypeId;

/// A finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round counter for this simulation
    pub round_number: u32,
    /// Ruleset key the round was played with
    pub variation: String,
    pub winner: TypeId,
    pub winner_label: String,
    /// Host time (seconds) when the round was seeded
    pub started_at: f64,
    /// Host time from seeding to convergence
    pub duration_secs: f64,
    /// e.g. "🪨×5 📄×5 ✂️×5"
    pub initial_distribution: String,
}

/// Bounded FIFO of finished rounds
#[derive(Debug, Clone, PartialEq)]
pub struct RoundHistory {
    entries: VecDeque<RoundRecord>,
    capacity: usize,
}

impl Default for RoundHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ROUND_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a round; returns the evicted oldest record once full
    pub fn push(&mut self, record: RoundRecord) -> Option<RoundRecord> {
        self.entries.push_back(record);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&RoundRecord> {
        self.entries.back()
    }

    pub fn oldest(&self) -> Option<&RoundRecord> {
        self.entries.front()
    }

    /// Newest first, the order the history table shows
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &RoundRecord> {
        self.entries.iter().rev()
    }

    /// Wins per type for one variation, indexed by `TypeId`
    pub fn win_counts(&self, variation: &str, type_count: usize) -> Vec<u32> {
        let mut wins = vec![0; type_count];
        for record in self.entries.iter().filter(|r| r.variation == variation) {
            if let Some(w) = wins.get_mut(record.winner.index()) {
                *w += 1;
            }
        }
        wins
    }

    /// Mean round length in seconds
    pub fn average_duration(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let total: f64 = self.entries.iter().map(|r| r.duration_secs).sum();
        Some(total / self.entries.len() as f64)
    }
}
