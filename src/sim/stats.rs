//! Population statistics for the HUD and distribution chart

use std::collections::VecDeque;

use super::state::Item;

/// Items per type, indexed by `TypeId`
pub fn type_counts(items: &[Item], type_count: usize) -> Vec<u32> {
    let mut counts = vec![0; type_count];
    for item in items {
        if let Some(c) = counts.get_mut(item.kind.index()) {
            *c += 1;
        }
    }
    counts
}

pub fn distinct_types(items: &[Item]) -> usize {
    let mut seen: Vec<_> = items.iter().map(|i| i.kind).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

/// Glow intensity and radius for an item whose type holds `share` of the population
#[inline]
pub fn population_glow(share: f32, size: f32) -> (f32, f32) {
    let share = share.clamp(0.0, 1.0);
    (0.2 + share * 0.6, size * (1.3 + share * 0.7))
}

/// Counts at one moment of a round
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSample {
    /// Seconds since the round started
    pub elapsed_secs: f64,
    pub counts: Vec<u32>,
}

pub const DEFAULT_SAMPLE_INTERVAL_SECS: f64 = 1.0;
pub const MAX_SAMPLES: usize = 600;

/// Per-round time series of type counts
#[derive(Debug, Clone)]
pub struct DistributionSampler {
    interval: f64,
    round_start: f64,
    next_at: f64,
    samples: VecDeque<DistributionSample>,
}

impl Default for DistributionSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL_SECS)
    }
}

impl DistributionSampler {
    pub fn new(interval: f64) -> Self {
        Self {
            interval: interval.max(0.0),
            round_start: 0.0,
            next_at: 0.0,
            samples: VecDeque::new(),
        }
    }

    pub fn set_interval(&mut self, interval: f64) {
        self.interval = interval.max(0.0);
    }

    /// Drop all samples; the first sample of the round is taken immediately
    pub fn reset(&mut self, now: f64) {
        self.samples.clear();
        self.round_start = now;
        self.next_at = now;
    }

    /// Record counts if the interval has elapsed; returns true when a sample was taken
    pub fn sample(&mut self, items: &[Item], type_count: usize, now: f64) -> bool {
        if now < self.next_at {
            return false;
        }
        if self.samples.len() >= MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(DistributionSample {
            elapsed_secs: now - self.round_start,
            counts: type_counts(items, type_count),
        });
        self.next_at = now + self.interval;
        true
    }

    pub fn samples(&self) -> impl Iterator<Item = &DistributionSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&DistributionSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
