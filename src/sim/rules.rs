//! Type set and beats-relation
//!
//! Types are small integers indexing a `TypeSet`; the beats-relation is a
//! dense boolean matrix so every pair lookup is O(1) and "no edge either
//! way" is an explicit `Matchup::Tie`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Index of a type within the active `TypeSet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u16);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Display data for one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Upper-case key used by rules (e.g. "ROCK")
    pub key: String,
    /// Short label drawn on the item (usually an emoji)
    pub label: String,
    /// CSS color for glows and charts
    pub color: String,
}

impl TypeDef {
    pub fn new(key: &str, label: &str, color: &str) -> Self {
        Self {
            key: key.to_uppercase(),
            label: label.to_string(),
            color: color.to_string(),
        }
    }

    /// The type color as a CSS `rgba()` with the given alpha.
    ///
    /// Understands `#rrggbb` and `#rgb`; anything else is returned unchanged.
    pub fn rgba(&self, alpha: f32) -> String {
        let hex = match self.color.strip_prefix('#') {
            Some(hex) if hex.is_ascii() => hex,
            _ => return self.color.clone(),
        };
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        let rgb = match hex.len() {
            6 => (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
            3 => (
                channel(&hex[0..1]).map(|v| v * 17),
                channel(&hex[1..2]).map(|v| v * 17),
                channel(&hex[2..3]).map(|v| v * 17),
            ),
            _ => return self.color.clone(),
        };
        match rgb {
            (Some(r), Some(g), Some(b)) => format!("rgba({}, {}, {}, {})", r, g, b, alpha),
            _ => self.color.clone(),
        }
    }
}

/// Ordered set of types; position in the list is the `TypeId`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSet {
    defs: Vec<TypeDef>,
}

impl TypeSet {
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeDef> {
        self.defs.get(id.index())
    }

    /// Label for a type, "?" if the id is out of range
    pub fn label(&self, id: TypeId) -> &str {
        self.get(id).map(|d| d.label.as_str()).unwrap_or("?")
    }

    /// Case-insensitive key lookup
    pub fn find(&self, key: &str) -> Option<TypeId> {
        let key = key.to_uppercase();
        self.defs
            .iter()
            .position(|d| d.key == key)
            .map(|i| TypeId(i as u16))
    }

    pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.defs.len()).map(|i| TypeId(i as u16))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDef)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(i, d)| (TypeId(i as u16), d))
    }
}

/// Outcome of a pair, from the first item's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matchup {
    Wins,
    Loses,
    Tie,
}

/// Directed beats-graph over `n` types
#[derive(Debug, Clone, PartialEq)]
pub struct RulesGraph {
    n: usize,
    beats: Vec<bool>,
}

impl RulesGraph {
    /// Graph with no edges (every pair ties)
    pub fn empty(n: usize) -> Self {
        Self {
            n,
            beats: vec![false; n * n],
        }
    }

    pub fn type_count(&self) -> usize {
        self.n
    }

    /// Add `winner beats loser`. Out-of-range ids are ignored.
    pub fn add_edge(&mut self, winner: TypeId, loser: TypeId) {
        let (w, l) = (winner.index(), loser.index());
        if w < self.n && l < self.n {
            self.beats[w * self.n + l] = true;
        }
    }

    #[inline]
    pub fn beats(&self, winner: TypeId, loser: TypeId) -> bool {
        let (w, l) = (winner.index(), loser.index());
        w < self.n && l < self.n && self.beats[w * self.n + l]
    }

    pub fn matchup(&self, a: TypeId, b: TypeId) -> Matchup {
        if self.beats(a, b) {
            Matchup::Wins
        } else if self.beats(b, a) {
            Matchup::Loses
        } else {
            Matchup::Tie
        }
    }

    pub fn edge_count(&self) -> usize {
        self.beats.iter().filter(|&&b| b).count()
    }

    /// All `(winner, loser)` edges in row-major order
    pub fn edges(&self) -> impl Iterator<Item = (TypeId, TypeId)> + '_ {
        self.beats
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| (TypeId((i / self.n) as u16), TypeId((i % self.n) as u16)))
    }

    /// Types with no edge in or out; they can never convert or be converted
    pub fn isolated_types(&self) -> Vec<TypeId> {
        (0..self.n)
            .filter(|&t| {
                (0..self.n).all(|o| !self.beats[t * self.n + o] && !self.beats[o * self.n + t])
            })
            .map(|t| TypeId(t as u16))
            .collect()
    }
}

/// Oscillator shape for collision tones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

/// Tone palette for a ruleset
///
/// Every variation gets an explicit profile or `SoundProfile::default()`
/// (the classic sine palette); nothing is synthesized at random.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundProfile {
    pub waveform: Waveform,
    pub base_frequency: f32,
    pub second_frequency: f32,
    pub third_frequency: f32,
    pub attack_secs: f32,
    pub release_secs: f32,
}

impl Default for SoundProfile {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            base_frequency: 440.0,   // A4
            second_frequency: 523.25, // C5
            third_frequency: 329.63, // E4
            attack_secs: 0.01,
            release_secs: 0.3,
        }
    }
}

impl SoundProfile {
    /// Pitch for `from` turning into `to`, picked by their distance in type order
    pub fn transform_frequency(&self, from: TypeId, to: TypeId, type_count: usize) -> f32 {
        if type_count == 0 {
            return self.base_frequency;
        }
        let (from, to) = (from.index(), to.index());
        if (from + 1) % type_count == to {
            self.base_frequency
        } else if (from + 2) % type_count == to {
            self.second_frequency
        } else {
            self.third_frequency
        }
    }

    pub fn tie_frequency(&self) -> f32 {
        (self.base_frequency + self.second_frequency) / 2.0
    }

    /// Ties use a contrasting oscillator
    pub fn tie_waveform(&self) -> Waveform {
        if self.waveform == Waveform::Sine {
            Waveform::Triangle
        } else {
            Waveform::Sine
        }
    }

    pub fn duration_secs(&self) -> f32 {
        self.attack_secs + self.release_secs
    }

    /// Frequencies and release must be finite and positive, attack finite and not negative
    pub fn validate(&self, variation: &str) -> Result<(), ConfigError> {
        let positive = [
            ("base_frequency", self.base_frequency),
            ("second_frequency", self.second_frequency),
            ("third_frequency", self.third_frequency),
            ("release_secs", self.release_secs),
        ];
        let bad = positive
            .into_iter()
            .find(|(_, v)| !(v.is_finite() && *v > 0.0))
            .or_else(|| {
                let attack = self.attack_secs;
                (!(attack.is_finite() && attack >= 0.0)).then_some(("attack_secs", attack))
            });
        match bad {
            Some((field, value)) => Err(ConfigError::InvalidSound {
                variation: variation.to_string(),
                field,
                value: value as f64,
            }),
            None => Ok(()),
        }
    }
}

/// A validated ruleset: types, beats-graph and tone palette
#[derive(Debug, Clone, PartialEq)]
pub struct Ruleset {
    pub key: String,
    pub name: String,
    pub types: TypeSet,
    pub graph: RulesGraph,
    pub sound: SoundProfile,
}

impl Ruleset {
    /// Build and validate a ruleset from type definitions and `(winner, loser)` key pairs.
    ///
    /// Keys are matched case-insensitively. Fails on fewer than two types,
    /// duplicate keys, unknown keys, self-edges and mutual edges.
    pub fn new(
        key: &str,
        name: &str,
        types: Vec<TypeDef>,
        rules: &[(String, String)],
        sound: SoundProfile,
    ) -> Result<Self, ConfigError> {
        let variation = key.to_string();
        if types.len() < 2 {
            return Err(ConfigError::TooFewTypes {
                variation,
                count: types.len(),
            });
        }
        let types: Vec<TypeDef> = types
            .into_iter()
            .map(|d| TypeDef {
                key: d.key.to_uppercase(),
                ..d
            })
            .collect();
        for (i, def) in types.iter().enumerate() {
            if types[..i].iter().any(|d| d.key == def.key) {
                return Err(ConfigError::DuplicateType {
                    variation,
                    key: def.key.clone(),
                });
            }
        }
        let types = TypeSet { defs: types };

        let mut graph = RulesGraph::empty(types.len());
        for (winner, loser) in rules {
            let w = types.find(winner).ok_or_else(|| ConfigError::UnknownType {
                variation: variation.clone(),
                key: winner.clone(),
            })?;
            let l = types.find(loser).ok_or_else(|| ConfigError::UnknownType {
                variation: variation.clone(),
                key: loser.clone(),
            })?;
            if w == l {
                return Err(ConfigError::SelfRule {
                    variation,
                    key: winner.to_uppercase(),
                });
            }
            if graph.beats(l, w) {
                return Err(ConfigError::ContradictoryRule {
                    variation,
                    a: winner.to_uppercase(),
                    b: loser.to_uppercase(),
                });
            }
            graph.add_edge(w, l);
        }

        sound.validate(key)?;

        let isolated = graph.isolated_types();
        if !isolated.is_empty() {
            log::warn!(
                "Ruleset {} has {} type(s) with no rules; rounds may never conclude",
                key,
                isolated.len()
            );
        }

        Ok(Self {
            key: key.to_string(),
            name: name.to_string(),
            types,
            graph,
            sound,
        })
    }

    /// Rock beats scissors, scissors beats paper, paper beats rock
    pub fn classic() -> Self {
        let types = TypeSet {
            defs: vec![
                TypeDef::new("ROCK", "🪨", "#ef4444"),
                TypeDef::new("PAPER", "📄", "#3b82f6"),
                TypeDef::new("SCISSORS", "✂️", "#22c55e"),
            ],
        };
        let mut graph = RulesGraph::empty(3);
        graph.add_edge(TypeId(0), TypeId(2));
        graph.add_edge(TypeId(2), TypeId(1));
        graph.add_edge(TypeId(1), TypeId(0));
        Self {
            key: "classic".to_string(),
            name: "Classic RPS".to_string(),
            types,
            graph,
            sound: SoundProfile::default(),
        }
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn matchup(&self, a: TypeId, b: TypeId) -> Matchup {
        self.graph.matchup(a, b)
    }
}
