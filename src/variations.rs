//! Ruleset documents
//!
//! Variations are authored as JSON (types with emoji labels and colors,
//! winner/loser rules, an optional tone palette) and validated into
//! `Ruleset`s when the catalog is built.

use rand::Rng;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::sim::{Ruleset, SoundProfile, TypeDef};

/// Built-in variations, embedded at compile time
pub const BUILTIN_VARIATIONS: &str = include_str!("../assets/variations.json");

#[derive(Debug, Deserialize)]
struct CatalogDoc {
    variations: Vec<VariationDoc>,
}

#[derive(Debug, Deserialize)]
struct VariationDoc {
    key: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    types: Vec<TypeDoc>,
    #[serde(default)]
    rules: Vec<RuleDoc>,
    #[serde(default)]
    sound: Option<SoundProfile>,
}

#[derive(Debug, Deserialize)]
struct TypeDoc {
    key: String,
    label: String,
    color: String,
}

#[derive(Debug, Deserialize)]
struct RuleDoc {
    winner: String,
    loser: String,
}

impl VariationDoc {
    fn into_variation(self) -> Result<Variation, ConfigError> {
        let types = self
            .types
            .iter()
            .map(|t| TypeDef::new(&t.key, &t.label, &t.color))
            .collect();
        let rules: Vec<(String, String)> =
            self.rules.into_iter().map(|r| (r.winner, r.loser)).collect();
        let sound = self.sound.unwrap_or_default();
        let ruleset = Ruleset::new(&self.key, &self.name, types, &rules, sound)?;
        Ok(Variation {
            ruleset,
            description: self.description,
        })
    }
}

/// A named ruleset plus its optional blurb
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub ruleset: Ruleset,
    pub description: Option<String>,
}

impl Variation {
    pub fn key(&self) -> &str {
        &self.ruleset.key
    }

    /// The authored description, or one built from the types and rule count
    pub fn describe(&self) -> String {
        if let Some(text) = &self.description {
            return text.clone();
        }
        let types: Vec<String> = self
            .ruleset
            .types
            .iter()
            .map(|(_, def)| format!("{} {}", def.label, def.key.to_lowercase()))
            .collect();
        format!(
            "{}: {}. Contains {} rules.",
            self.ruleset.name,
            types.join(", "),
            self.ruleset.graph.edge_count()
        )
    }
}

/// All variations the host can switch between, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct VariationCatalog {
    variations: Vec<Variation>,
}

impl VariationCatalog {
    /// Parse and validate a catalog document. Any invalid variation fails the whole load.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let doc: CatalogDoc = serde_json::from_str(doc)?;
        if doc.variations.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut variations: Vec<Variation> = Vec::with_capacity(doc.variations.len());
        for entry in doc.variations {
            let variation = entry.into_variation()?;
            if variations.iter().any(|v| v.key() == variation.key()) {
                return Err(ConfigError::DuplicateVariation(variation.key().to_string()));
            }
            variations.push(variation);
        }

        log::info!("Loaded {} variations", variations.len());
        Ok(Self { variations })
    }

    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_VARIATIONS)
    }

    pub fn get(&self, key: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.key() == key)
    }

    pub fn ruleset(&self, key: &str) -> Result<&Ruleset, ConfigError> {
        self.get(key)
            .map(|v| &v.ruleset)
            .ok_or_else(|| ConfigError::UnknownVariation(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.variations.iter().map(|v| v.key())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variation> {
        self.variations.iter()
    }

    pub fn len(&self) -> usize {
        self.variations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variations.is_empty()
    }

    /// Uniformly pick a variation other than `current` (or `current` itself if it is the only one)
    pub fn pick_other<R: Rng>(&self, current: &str, rng: &mut R) -> &Variation {
        let candidates: Vec<&Variation> =
            self.variations.iter().filter(|v| v.key() != current).collect();
        if candidates.is_empty() {
            return &self.variations[0];
        }
        candidates[rng.random_range(0..candidates.len())]
    }

    /// Description for `key`, "Unknown variation" if absent
    pub fn describe(&self, key: &str) -> String {
        self.get(key)
            .map(Variation::describe)
            .unwrap_or_else(|| "Unknown variation".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Matchup, TypeId, Waveform};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = VariationCatalog::builtin().unwrap();
        assert!(catalog.len() >= 4);
        for key in ["classic", "rpsls", "elemental", "standoff"] {
            assert!(catalog.get(key).is_some(), "missing {}", key);
        }

        let classic = catalog.ruleset("classic").unwrap();
        assert_eq!(classic.types.label(TypeId(0)), "🪨");
        assert_eq!(classic.matchup(TypeId(0), TypeId(2)), Matchup::Wins);
        assert_eq!(classic.graph, Ruleset::classic().graph);
    }

    #[test]
    fn test_rpsls_is_a_tournament() {
        let catalog = VariationCatalog::builtin().unwrap();
        let rpsls = catalog.ruleset("rpsls").unwrap();
        assert_eq!(rpsls.type_count(), 5);
        assert_eq!(rpsls.graph.edge_count(), 10);
        for a in rpsls.types.ids() {
            for b in rpsls.types.ids() {
                if a != b {
                    assert_ne!(rpsls.matchup(a, b), Matchup::Tie);
                }
            }
        }
    }

    #[test]
    fn test_standoff_has_ties() {
        let catalog = VariationCatalog::builtin().unwrap();
        let standoff = catalog.ruleset("standoff").unwrap();
        let knight = standoff.types.find("knight").unwrap();
        let wizard = standoff.types.find("wizard").unwrap();
        assert_eq!(standoff.matchup(knight, wizard), Matchup::Tie);
    }

    #[test]
    fn test_missing_sound_uses_default_profile() {
        let catalog = VariationCatalog::builtin().unwrap();
        assert_eq!(catalog.ruleset("rpsls").unwrap().sound, SoundProfile::default());
        assert_eq!(catalog.ruleset("elemental").unwrap().sound.waveform, Waveform::Triangle);
    }

    #[test]
    fn test_describe_falls_back() {
        let doc = r##"{"variations":[{"key":"duo","name":"Duo","types":[
            {"key":"a","label":"🅰️","color":"#f00"},
            {"key":"b","label":"🅱️","color":"#00f"}],
            "rules":[{"winner":"a","loser":"b"}]}]}"##;
        let catalog = VariationCatalog::from_json(doc).unwrap();
        assert_eq!(catalog.describe("duo"), "Duo: 🅰️ a, 🅱️ b. Contains 1 rules.");
        assert_eq!(catalog.describe("nope"), "Unknown variation");
    }

    #[test]
    fn test_invalid_documents_are_rejected() {
        assert!(matches!(VariationCatalog::from_json("{"), Err(ConfigError::Parse(_))));
        assert_eq!(
            VariationCatalog::from_json(r#"{"variations":[]}"#),
            Err(ConfigError::EmptyCatalog)
        );

        let one_type = r##"{"variations":[{"key":"x","name":"X","types":[
            {"key":"a","label":"A","color":"#fff"}]}]}"##;
        assert!(matches!(
            VariationCatalog::from_json(one_type),
            Err(ConfigError::TooFewTypes { count: 1, .. })
        ));

        let bad_rule = r##"{"variations":[{"key":"x","name":"X","types":[
            {"key":"a","label":"A","color":"#fff"},{"key":"b","label":"B","color":"#000"}],
            "rules":[{"winner":"a","loser":"c"}]}]}"##;
        assert!(matches!(
            VariationCatalog::from_json(bad_rule),
            Err(ConfigError::UnknownType { .. })
        ));

        let dup = r##"{"variations":[
            {"key":"x","name":"X","types":[
                {"key":"a","label":"A","color":"#fff"},{"key":"b","label":"B","color":"#000"}]},
            {"key":"x","name":"X2","types":[
                {"key":"a","label":"A","color":"#fff"},{"key":"b","label":"B","color":"#000"}]}
        ]}"##;
        assert_eq!(
            VariationCatalog::from_json(dup),
            Err(ConfigError::DuplicateVariation("x".into()))
        );
    }

    #[test]
    fn test_bad_sound_profile_is_rejected() {
        let doc = r##"{"variations":[{"key":"hum","name":"Hum","types":[
            {"key":"a","label":"A","color":"#fff"},{"key":"b","label":"B","color":"#000"}],
            "rules":[{"winner":"a","loser":"b"}],
            "sound":{"waveform":"sine","base_frequency":-440.0,"second_frequency":523.25,
                "third_frequency":329.63,"attack_secs":0.01,"release_secs":0.3}}]}"##;
        assert!(matches!(
            VariationCatalog::from_json(doc),
            Err(ConfigError::InvalidSound { field: "base_frequency", .. })
        ));
    }

    #[test]
    fn test_unknown_variation_is_an_error() {
        let catalog = VariationCatalog::builtin().unwrap();
        assert_eq!(
            catalog.ruleset("chess").map(|r| r.key.clone()),
            Err(ConfigError::UnknownVariation("chess".into()))
        );
    }

    #[test]
    fn test_pick_other_never_repeats() {
        let catalog = VariationCatalog::builtin().unwrap();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut current = "classic".to_string();
        for _ in 0..50 {
            let next = catalog.pick_other(&current, &mut rng).key().to_string();
            assert_ne!(next, current);
            current = next;
        }
    }
}
