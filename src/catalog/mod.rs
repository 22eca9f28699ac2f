pub mod filters;
pub mod holder;
pub mod loader;
pub mod normalize;

pub use filters::*;
pub use holder::CatalogHolder;

use crate::models::Song;
use std::collections::{BTreeMap, BTreeSet};

/// Immutable, insertion-ordered song collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongCatalog {
    songs: Vec<Song>,
}

impl SongCatalog {
    pub fn new(songs: impl IntoIterator<Item = Song>) -> Self {
        Self {
            songs: songs.into_iter().collect(),
        }
    }

    /// Every song in source order
    pub fn all(&self) -> &[Song] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Songs matching every given predicate, in catalog order
    pub fn filter(
        &self,
        decade: Option<&str>,
        mood: Option<&str>,
        situation: Option<&str>,
    ) -> Vec<&Song> {
        self.query(&CatalogQuery::new(decade, mood, situation))
    }

    pub fn query(&self, query: &CatalogQuery) -> Vec<&Song> {
        self.songs
            .iter()
            .filter(|song| SongFilters::should_include_song(song, query))
            .collect()
    }

    /// Distinct decade labels, ascending
    pub fn decades(&self) -> Vec<String> {
        self.songs
            .iter()
            .map(Song::decade)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// How many songs carry each mood tag
    pub fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.songs.iter().flat_map(|song| song.mood_tags()) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        counts
    }
}
