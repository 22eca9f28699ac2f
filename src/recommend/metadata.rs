use crate::models::{Participant, SongSummary};
use serde::Serialize;
use std::collections::BTreeMap;

/// One (song, singer) pair in a setlist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetlistEntry {
    pub song: SongSummary,
    pub singer: Participant,
    /// Why this singer was picked for this song
    pub reason: String,
    /// 1-based position in the setlist
    pub order: usize,
    #[serde(skip)]
    pub song_score: f64,
    /// Position of the singer in the member list
    #[serde(skip)]
    pub singer_index: usize,
}

/// Represents a generated setlist with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Setlist {
    pub entries: Vec<SetlistEntry>,
    pub metadata: SetlistMetadata,
}

/// Metadata about the setlist composition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetlistMetadata {
    pub total_songs: usize,
    pub decade_distribution: BTreeMap<String, usize>,
    /// Songs per singer, keyed by "#<position> <name>" so namesakes stay apart
    pub songs_per_singer: BTreeMap<String, usize>,
    pub average_score: f64,
}

impl SetlistMetadata {
    pub fn from_entries(entries: &[SetlistEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let mut decade_distribution = BTreeMap::new();
        let mut songs_per_singer = BTreeMap::new();
        for entry in entries {
            let decade = format!("{}s", entry.song.year.div_euclid(10) * 10);
            *decade_distribution.entry(decade).or_insert(0) += 1;
            let singer = format!(
                "#{} {}",
                entry.singer_index + 1,
                entry.singer.display_name()
            );
            *songs_per_singer.entry(singer).or_insert(0) += 1;
        }

        let average_score =
            entries.iter().map(|e| e.song_score).sum::<f64>() / entries.len() as f64;

        Self {
            total_songs: entries.len(),
            decade_distribution,
            songs_per_singer,
            average_score,
        }
    }
}
