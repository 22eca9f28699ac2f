use crate::error::{KaraokeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the recommendation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scoring_weights: ScoringWeights,
    #[serde(default)]
    pub singer_weights: SingerWeights,
    /// Share of a tag bucket awarded for a substring (partial) tag match
    #[serde(default = "default_partial_match_ratio")]
    pub partial_match_ratio: f64,
    /// Songs in a setlist when the caller does not say
    #[serde(default = "default_setlist_length")]
    pub default_setlist_length: usize,
    /// Fixed RNG seed; `None` draws fresh entropy per call
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Maximum points per song sub-score; must sum to at most 100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub era: f64,
    pub gender: f64,
    pub mood: f64,
    pub situation: f64,
}

/// Maximum points per singer sub-score.
///
/// Only members with the fewest turns so far are eligible for a song, and they
/// all share the same `fairness` term. `fairness` therefore shifts the reported
/// totals but never changes who sings; `gender` and `era` decide that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingerWeights {
    pub gender: f64,
    pub era: f64,
    pub fairness: f64,
}

fn default_partial_match_ratio() -> f64 {
    0.8
}

fn default_setlist_length() -> usize {
    10
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            era: 40.0,
            gender: 30.0,
            mood: 15.0,
            situation: 15.0,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.era + self.gender + self.mood + self.situation
    }
}

impl Default for SingerWeights {
    fn default() -> Self {
        Self {
            gender: 40.0,
            era: 30.0,
            fairness: 30.0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring_weights: ScoringWeights::default(),
            singer_weights: SingerWeights::default(),
            partial_match_ratio: default_partial_match_ratio(),
            default_setlist_length: default_setlist_length(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load an engine configuration from a JSON file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| KaraokeError::Config(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject weights that could push a score outside [0, 100]
    pub fn validate(&self) -> Result<()> {
        let weights = &self.scoring_weights;
        let all_weights = [
            ("scoring_weights.era", weights.era),
            ("scoring_weights.gender", weights.gender),
            ("scoring_weights.mood", weights.mood),
            ("scoring_weights.situation", weights.situation),
            ("singer_weights.gender", self.singer_weights.gender),
            ("singer_weights.era", self.singer_weights.era),
            ("singer_weights.fairness", self.singer_weights.fairness),
        ];
        if let Some((name, value)) = all_weights
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(KaraokeError::Config(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }

        if weights.total() > 100.0 {
            return Err(KaraokeError::Config(format!(
                "scoring weights sum to {}, maximum is 100",
                weights.total()
            )));
        }

        if !(0.0..=1.0).contains(&self.partial_match_ratio) {
            return Err(KaraokeError::Config(format!(
                "partial_match_ratio must be within 0.0..=1.0, got {}",
                self.partial_match_ratio
            )));
        }

        if self.default_setlist_length == 0 {
            return Err(KaraokeError::Config(
                "default_setlist_length must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
