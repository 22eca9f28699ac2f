//! Fallback-chain song selection.
//!
//! Stages run from strictest to loosest and stop at the first one that yields
//! candidates. Only an empty catalog makes selection fail.

use super::resolver::TargetAttributes;
use super::scoring::{ScoredCandidate, SongScorer, SongScoring};
use crate::catalog::{CatalogQuery, SongCatalog};
use crate::error::{KaraokeError, Result};
use crate::models::Song;
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;
use tracing::{debug, info};

/// Filter stage of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStage {
    DecadeMoodSituation,
    DecadeOnly,
    FullCatalog,
}

impl fmt::Display for SelectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SelectionStage::DecadeMoodSituation => "decade+mood+situation",
            SelectionStage::DecadeOnly => "decade",
            SelectionStage::FullCatalog => "full catalog",
        };
        f.write_str(label)
    }
}

impl SelectionStage {
    /// Stages to try for a target. The strict stage is skipped when it would
    /// be identical to the decade-only stage.
    pub fn chain(target: &TargetAttributes) -> Vec<SelectionStage> {
        let mut stages = Vec::with_capacity(3);
        if target.mood.is_some() || target.situation.is_some() {
            stages.push(SelectionStage::DecadeMoodSituation);
        }
        stages.push(SelectionStage::DecadeOnly);
        stages.push(SelectionStage::FullCatalog);
        stages
    }

    pub fn candidates<'a>(
        &self,
        catalog: &'a SongCatalog,
        target: &TargetAttributes,
    ) -> Vec<&'a Song> {
        let decade = target.decade();
        match self {
            SelectionStage::DecadeMoodSituation => catalog.query(&CatalogQuery::new(
                Some(decade.as_str()),
                target.mood.as_deref(),
                target.situation.as_deref(),
            )),
            SelectionStage::DecadeOnly => catalog.query(&CatalogQuery::decade_only(&decade)),
            SelectionStage::FullCatalog => catalog.all().iter().collect(),
        }
    }
}

/// The chosen song and the stage it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub candidate: ScoredCandidate<'a>,
    pub stage: SelectionStage,
}

/// Song selection using static helper functions
pub struct SongSelector;

impl SongSelector {
    /// Pick the best song, breaking ties among top scorers with the RNG
    pub fn select<'a, S, R>(
        catalog: &'a SongCatalog,
        scorer: &S,
        target: &TargetAttributes,
        rng: &mut R,
    ) -> Result<Selection<'a>>
    where
        S: SongScorer + ?Sized,
        R: Rng + ?Sized,
    {
        for stage in SelectionStage::chain(target) {
            let candidates = stage.candidates(catalog, target);
            if candidates.is_empty() {
                debug!("Stage '{}' yielded no candidates", stage);
                continue;
            }

            let ranked = SongScoring::rank(scorer, &candidates, target)?;
            let top_score = ranked[0].score;
            let tied: Vec<&ScoredCandidate<'a>> = ranked
                .iter()
                .take_while(|candidate| candidate.score == top_score)
                .collect();

            let Some(&chosen) = tied.choose(rng) else {
                continue;
            };

            info!(
                "Selected '{}' by '{}' (score {:.2}) from stage '{}' ({} candidates, {} tied)",
                chosen.song.title(),
                chosen.song.artist(),
                chosen.score,
                stage,
                candidates.len(),
                tied.len()
            );

            return Ok(Selection {
                candidate: chosen.clone(),
                stage,
            });
        }

        Err(KaraokeError::EmptyCatalog)
    }

    /// Up to `count` distinct songs, best first, walking the fallback chain
    /// until enough songs are collected
    pub fn select_top<'a, S, R>(
        catalog: &'a SongCatalog,
        scorer: &S,
        target: &TargetAttributes,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<ScoredCandidate<'a>>>
    where
        S: SongScorer + ?Sized,
        R: Rng + ?Sized,
    {
        if catalog.is_empty() {
            return Err(KaraokeError::EmptyCatalog);
        }

        let mut chosen: Vec<ScoredCandidate<'a>> = Vec::with_capacity(count);

        for stage in SelectionStage::chain(target) {
            if chosen.len() >= count {
                break;
            }

            let candidates: Vec<&'a Song> = stage
                .candidates(catalog, target)
                .into_iter()
                .filter(|song| !chosen.iter().any(|c| std::ptr::eq(c.song, *song)))
                .collect();

            let mut ranked = SongScoring::rank(scorer, &candidates, target)?;
            shuffle_ties(&mut ranked, rng);

            let needed = count - chosen.len();
            debug!(
                "Stage '{}' contributes {} of {} new candidates",
                stage,
                needed.min(ranked.len()),
                ranked.len()
            );
            chosen.extend(ranked.into_iter().take(needed));
        }

        Ok(chosen)
    }
}

/// Shuffle each run of equal scores in place so repeated requests vary
fn shuffle_ties<R: Rng + ?Sized>(ranked: &mut [ScoredCandidate<'_>], rng: &mut R) {
    let mut start = 0;
    while start < ranked.len() {
        let score = ranked[start].score;
        let end = ranked[start..]
            .iter()
            .position(|candidate| candidate.score != score)
            .map_or(ranked.len(), |offset| start + offset);
        ranked[start..end].shuffle(rng);
        start = end;
    }
}
