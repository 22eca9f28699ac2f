use super::config::{EngineConfig, ScoringWeights};
use super::resolver::{GroupAffinity, TargetAttributes};
use crate::error::{KaraokeError, Result};
use crate::models::{GenderAffinity, Song};
use std::collections::BTreeSet;
use tracing::error;

/// A song paired with its match score for the current request
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub song: &'a Song,
    /// 0.0 to 100.0, rounded to 2 decimals
    pub score: f64,
}

/// Strategy for scoring a song against target attributes
#[cfg_attr(test, mockall::automock)]
pub trait SongScorer {
    /// Match score in [0, 100]
    fn score(&self, song: &Song, target: &TargetAttributes) -> f64;
}

/// Canonical scorer: era proximity, gender affinity and tag matches, summed
#[derive(Debug, Clone)]
pub struct TagMatchScorer {
    weights: ScoringWeights,
    partial_match_ratio: f64,
}

impl TagMatchScorer {
    pub fn new(weights: ScoringWeights, partial_match_ratio: f64) -> Self {
        Self {
            weights,
            partial_match_ratio,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.scoring_weights.clone(), config.partial_match_ratio)
    }

    /// Full weight at the same decade, a quarter less per decade apart, nothing past 30 years
    pub fn era_score(&self, song_decade: i32, target_era: i32) -> f64 {
        let era_diff = (song_decade - target_era).abs();
        let ratio = if era_diff == 0 {
            1.0
        } else if era_diff <= 10 {
            0.75
        } else if era_diff <= 20 {
            0.5
        } else if era_diff <= 30 {
            0.25
        } else {
            0.0
        };
        self.weights.era * ratio
    }

    /// Unisex songs and mixed groups sit in the middle; a mismatch still earns a little
    pub fn gender_score(&self, song: GenderAffinity, group: GroupAffinity) -> f64 {
        let weight = self.weights.gender;
        match (song, group) {
            (GenderAffinity::Unisex, _) | (_, GroupAffinity::Mixed) => weight * 2.0 / 3.0,
            (GenderAffinity::Male, GroupAffinity::MaleOnly)
            | (GenderAffinity::Female, GroupAffinity::FemaleOnly) => weight,
            _ => weight / 3.0,
        }
    }

    /// Exact tag, partial (substring) tag, neutral when nothing was asked for
    pub fn tag_score(&self, tags: &BTreeSet<String>, requested: Option<&str>, weight: f64) -> f64 {
        let Some(requested) = requested else {
            return weight * 0.5;
        };

        if tags.contains(requested) {
            weight
        } else if tags
            .iter()
            .any(|tag| tag.contains(requested) || requested.contains(tag.as_str()))
        {
            weight * self.partial_match_ratio
        } else {
            0.0
        }
    }
}

impl SongScorer for TagMatchScorer {
    fn score(&self, song: &Song, target: &TargetAttributes) -> f64 {
        let score = self.era_score(song.decade_start(), target.era)
            + self.gender_score(song.gender_affinity(), target.gender_affinity)
            + self.tag_score(song.mood_tags(), target.mood.as_deref(), self.weights.mood)
            + self.tag_score(
                song.situation_tags(),
                target.situation.as_deref(),
                self.weights.situation,
            );

        round_score(score).clamp(0.0, 100.0)
    }
}

/// Round to 2 decimal places
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// Ranking using static helper functions
pub struct SongScoring;

impl SongScoring {
    /// Score every candidate and sort descending; equal scores keep catalog order
    pub fn rank<'a, S: SongScorer + ?Sized>(
        scorer: &S,
        candidates: &[&'a Song],
        target: &TargetAttributes,
    ) -> Result<Vec<ScoredCandidate<'a>>> {
        let mut scored = Vec::with_capacity(candidates.len());

        for &song in candidates {
            let score = scorer.score(song, target);
            if !score.is_finite() || !(0.0..=100.0).contains(&score) {
                error!(
                    "Scorer produced {} for '{}' by '{}' (target {:?})",
                    score,
                    song.title(),
                    song.artist(),
                    target
                );
                return Err(KaraokeError::Internal(format!(
                    "score {score} out of range for '{}'",
                    song.title()
                )));
            }
            scored.push(ScoredCandidate { song, score });
        }

        // sort_by is stable, so ties stay in catalog order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(scored)
    }
}
