//! Round supervisor
//!
//! Active → (one type left) → Concluded → (restart delay) → Active.
//! The Concluded phase doubles as the single-fire guard: a round can only
//! be recorded while Active.

use std::fmt;

use super::rules::{TypeId, TypeSet};
use super::state::Item;
use crate::consts::ROUND_RESTART_DELAY_SECS;
use crate::history::{RoundHistory, RoundRecord};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundPhase {
    /// No round seeded yet
    Idle,
    Active,
    /// Winner decided; next round due at `restart_at` (host seconds)
    Concluded { winner: TypeId, restart_at: f64 },
}

/// Per-type item counts at seeding time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    entries: Vec<(TypeId, String, u32)>,
}

impl Distribution {
    pub fn push(&mut self, kind: TypeId, label: &str, count: u32) {
        self.entries.push((kind, label.to_string(), count));
    }

    pub fn count(&self, kind: TypeId) -> u32 {
        self.entries
            .iter()
            .find(|(k, _, _)| *k == kind)
            .map(|(_, _, c)| *c)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, _, c)| c).sum()
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (_, label, count)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}×{}", label, count)?;
        }
        Ok(())
    }
}

/// Detects convergence, records finished rounds and schedules restarts
#[derive(Debug, Clone)]
pub struct RoundSupervisor {
    phase: RoundPhase,
    round_number: u32,
    started_at: f64,
    variation: String,
    initial_distribution: String,
    restart_delay: f64,
    history: RoundHistory,
}

impl Default for RoundSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundSupervisor {
    pub fn new() -> Self {
        Self {
            phase: RoundPhase::Idle,
            round_number: 0,
            started_at: 0.0,
            variation: String::new(),
            initial_distribution: String::new(),
            restart_delay: ROUND_RESTART_DELAY_SECS,
            history: RoundHistory::new(),
        }
    }

    pub fn with_restart_delay(mut self, secs: f64) -> Self {
        self.restart_delay = secs.max(0.0);
        self
    }

    /// Enter Active for a freshly seeded round
    pub fn begin(&mut self, now: f64, variation: &str, distribution: &Distribution) {
        self.round_number += 1;
        self.phase = RoundPhase::Active;
        self.started_at = now;
        self.variation = variation.to_string();
        self.initial_distribution = distribution.to_string();
    }

    /// Conclude the round if exactly one type remains.
    ///
    /// Returns the new record on the transition only; repeated calls in the
    /// same state return `None`. An empty item list never concludes.
    pub fn check_round_end(
        &mut self,
        items: &[Item],
        types: &TypeSet,
        now: f64,
    ) -> Option<RoundRecord> {
        if self.phase != RoundPhase::Active {
            return None;
        }
        let winner = items.first()?.kind;
        if items.iter().any(|i| i.kind != winner) {
            return None;
        }

        let record = RoundRecord {
            round_number: self.round_number,
            variation: self.variation.clone(),
            winner,
            winner_label: types.label(winner).to_string(),
            started_at: self.started_at,
            duration_secs: (now - self.started_at).max(0.0),
            initial_distribution: self.initial_distribution.clone(),
        };
        log::info!(
            "Round {} won by {} in {:.1}s",
            record.round_number,
            record.winner_label,
            record.duration_secs
        );

        self.phase = RoundPhase::Concluded {
            winner,
            restart_at: now + self.restart_delay,
        };
        self.history.push(record.clone());
        Some(record)
    }

    /// True once a concluded round's restart delay has elapsed
    pub fn restart_due(&self, now: f64) -> bool {
        matches!(self.phase, RoundPhase::Concluded { restart_at, .. } if now >= restart_at)
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        (now - self.started_at).max(0.0)
    }

    pub fn initial_distribution(&self) -> &str {
        &self.initial_distribution
    }

    pub fn history(&self) -> &RoundHistory {
        &self.history
    }
}
