use super::normalize::{normalize_query, normalize_text};
use crate::models::Song;

/// Normalized filter predicates. Absent predicates match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub decade: Option<String>,
    pub mood: Option<String>,
    pub situation: Option<String>,
}

impl CatalogQuery {
    /// Build a query, normalizing every value the same way catalog tags are
    pub fn new(decade: Option<&str>, mood: Option<&str>, situation: Option<&str>) -> Self {
        Self {
            decade: decade.map(normalize_text).filter(|d| !d.is_empty()),
            mood: normalize_query(mood),
            situation: normalize_query(situation),
        }
    }

    pub fn decade_only(decade: &str) -> Self {
        Self::new(Some(decade), None, None)
    }
}

/// Song filtering functionality using static helper functions
pub struct SongFilters;

impl SongFilters {
    /// Exact match on the derived decade label
    pub fn matches_decade(song: &Song, query: &CatalogQuery) -> bool {
        let Some(decade) = &query.decade else {
            return true;
        };
        song.decade() == *decade
    }

    /// Exact membership in the song's mood tags
    pub fn matches_mood(song: &Song, query: &CatalogQuery) -> bool {
        let Some(mood) = &query.mood else {
            return true;
        };
        song.mood_tags().contains(mood)
    }

    /// Exact membership in the song's situation tags
    pub fn matches_situation(song: &Song, query: &CatalogQuery) -> bool {
        let Some(situation) = &query.situation else {
            return true;
        };
        song.situation_tags().contains(situation)
    }

    /// All predicates ANDed
    pub fn should_include_song(song: &Song, query: &CatalogQuery) -> bool {
        Self::matches_decade(song, query)
            && Self::matches_mood(song, query)
            && Self::matches_situation(song, query)
    }
}
