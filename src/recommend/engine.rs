use super::config::EngineConfig;
use super::metadata::{Setlist, SetlistEntry, SetlistMetadata};
use super::resolver::AttributeResolver;
use super::scoring::{SongScorer, TagMatchScorer};
use super::selector::SongSelector;
use super::singers::{SingerAssigner, SungCounts};
use crate::catalog::SongCatalog;
use crate::error::{KaraokeError, Result};
use crate::models::{RecommendationRequest, RecommendationResponse, Settings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{info, warn};

/// Main recommendation engine
pub struct RecommendationEngine {
    catalog: Arc<SongCatalog>,
    config: EngineConfig,
    scorer: Box<dyn SongScorer + Send + Sync>,
    assigner: SingerAssigner,
}

impl RecommendationEngine {
    /// Engine using the tag-matching scorer
    pub fn new(catalog: Arc<SongCatalog>, config: EngineConfig) -> Result<Self> {
        let scorer = TagMatchScorer::from_config(&config);
        Self::with_scorer(catalog, config, Box::new(scorer))
    }

    /// Engine with a custom scoring strategy
    pub fn with_scorer(
        catalog: Arc<SongCatalog>,
        config: EngineConfig,
        scorer: Box<dyn SongScorer + Send + Sync>,
    ) -> Result<Self> {
        config.validate()?;
        let assigner = SingerAssigner::new(config.singer_weights.clone());
        Ok(Self {
            catalog,
            config,
            scorer,
            assigner,
        })
    }

    pub fn catalog(&self) -> &SongCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh RNG for one call: seeded when configured, entropy otherwise
    pub fn new_rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Recommend one song and the singers for it
    pub fn recommend(&self, request: &RecommendationRequest) -> Result<RecommendationResponse> {
        let mut rng = self.new_rng();
        self.recommend_with_rng(request, &mut rng)
    }

    pub fn recommend_with_rng<R: Rng + ?Sized>(
        &self,
        request: &RecommendationRequest,
        rng: &mut R,
    ) -> Result<RecommendationResponse> {
        let settings = validated_settings(request)?;
        let members = &request.members;

        let target = AttributeResolver::resolve(members, &settings, rng);
        let selection = SongSelector::select(&self.catalog, self.scorer.as_ref(), &target, rng)?;
        let singers = SingerAssigner::assign(members, settings.mic_slots(), rng);

        info!(
            "Recommended '{}' ({} stage, score {:.2}) for {} member(s), {} singer(s)",
            selection.candidate.song.title(),
            selection.stage,
            selection.candidate.score,
            members.len(),
            singers.len()
        );

        Ok(RecommendationResponse {
            selected_song: selection.candidate.song.summary(),
            selected_singers: singers,
        })
    }

    /// Build a setlist of `num_songs` songs (engine default when `None`),
    /// spreading turns evenly across the group
    pub fn create_setlist(
        &self,
        request: &RecommendationRequest,
        num_songs: Option<usize>,
    ) -> Result<Setlist> {
        let mut rng = self.new_rng();
        self.create_setlist_with_rng(request, num_songs, &mut rng)
    }

    pub fn create_setlist_with_rng<R: Rng + ?Sized>(
        &self,
        request: &RecommendationRequest,
        num_songs: Option<usize>,
        rng: &mut R,
    ) -> Result<Setlist> {
        let settings = validated_settings(request)?;
        let members = &request.members;
        let num_songs = num_songs.unwrap_or(self.config.default_setlist_length);

        let target = AttributeResolver::resolve(members, &settings, rng);
        let songs = SongSelector::select_top(
            &self.catalog,
            self.scorer.as_ref(),
            &target,
            num_songs,
            rng,
        )?;
        if songs.len() < num_songs {
            warn!(
                "Catalog only has {} songs; setlist shortened from {}",
                songs.len(),
                num_songs
            );
        }

        let mut ledger = SungCounts::new(members);
        let mut entries = Vec::with_capacity(songs.len());

        for candidate in songs {
            let Some(choice) = self
                .assigner
                .choose_singer(candidate.song, members, &ledger, rng)
            else {
                continue;
            };
            ledger.record(choice.index);

            entries.push(SetlistEntry {
                song: candidate.song.summary(),
                singer: choice.participant.clone(),
                singer_index: choice.index,
                reason: choice.reason,
                order: entries.len() + 1,
                song_score: candidate.score,
            });
        }

        let metadata = SetlistMetadata::from_entries(&entries);
        info!(
            "Created setlist of {} songs for {} member(s), turns={:?}",
            entries.len(),
            members.len(),
            ledger.counts()
        );

        Ok(Setlist { entries, metadata })
    }
}

/// Reject requests without members; a missing settings object means defaults
fn validated_settings(request: &RecommendationRequest) -> Result<Settings> {
    if request.members.is_empty() {
        return Err(KaraokeError::EmptyInput("Members".to_string()));
    }
    Ok(request.settings.clone().unwrap_or_default())
}
