use crate::catalog::normalize::{decade_label, decade_start, normalize_tag, normalize_text};
use crate::error::SongValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// Which voices a song is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderAffinity {
    Male,
    Female,
    #[default]
    Unisex,
}

impl FromStr for GenderAffinity {
    type Err = SongValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "male" | "m" => Ok(GenderAffinity::Male),
            "female" | "f" => Ok(GenderAffinity::Female),
            "" | "unisex" | "mixed" | "any" => Ok(GenderAffinity::Unisex),
            other => Err(SongValidationError::new(format!(
                "invalid gender: {other}"
            ))),
        }
    }
}

impl fmt::Display for GenderAffinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GenderAffinity::Male => "male",
            GenderAffinity::Female => "female",
            GenderAffinity::Unisex => "unisex",
        };
        f.write_str(label)
    }
}

/// A validated catalog entry. Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    title: String,
    artist: String,
    year: i32,
    genre: String,
    mood_tags: BTreeSet<String>,
    situation_tags: BTreeSet<String>,
    gender_affinity: GenderAffinity,
}

impl Song {
    /// Normalize and validate a song record
    pub fn new<M, S>(
        title: &str,
        artist: &str,
        year: i32,
        genre: &str,
        mood_tags: M,
        situation_tags: S,
        gender_affinity: GenderAffinity,
    ) -> Result<Self, SongValidationError>
    where
        M: IntoIterator,
        M::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let title = normalize_text(title);
        let artist = normalize_text(artist);

        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(SongValidationError::new(format!("invalid year: {year}")));
        }
        if title.is_empty() {
            return Err(SongValidationError::new("title is required"));
        }
        if artist.is_empty() {
            return Err(SongValidationError::new("artist is required"));
        }

        Ok(Song {
            title,
            artist,
            year,
            genre: normalize_text(genre),
            mood_tags: normalize_tag_set(mood_tags),
            situation_tags: normalize_tag_set(situation_tags),
            gender_affinity,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn mood_tags(&self) -> &BTreeSet<String> {
        &self.mood_tags
    }

    pub fn situation_tags(&self) -> &BTreeSet<String> {
        &self.situation_tags
    }

    pub fn gender_affinity(&self) -> GenderAffinity {
        self.gender_affinity
    }

    /// First year of the song's decade (1999 -> 1990)
    pub fn decade_start(&self) -> i32 {
        decade_start(self.year)
    }

    /// Decade label such as "1990s"
    pub fn decade(&self) -> String {
        decade_label(self.year)
    }

    pub fn summary(&self) -> SongSummary {
        SongSummary {
            title: self.title.clone(),
            artist: self.artist.clone(),
            year: self.year,
            genre: self.genre.clone(),
        }
    }
}

fn normalize_tag_set<I>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| normalize_tag(tag.as_ref()))
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Song fields exposed in responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub genre: String,
}

/// Participant gender as sent by the client; anything unrecognized is `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    #[serde(other)]
    Other,
}

/// A group member taking part in the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub gender: Gender,
    pub age: u32,
}

impl Participant {
    pub fn new(id: &str, nickname: &str, gender: Gender, age: u32) -> Self {
        Participant {
            id: id.to_string(),
            nickname: nickname.to_string(),
            gender,
            age,
        }
    }

    /// Nickname for display, or the id when the nickname is blank
    pub fn display_name(&self) -> &str {
        if self.nickname.trim().is_empty() {
            &self.id
        } else {
            &self.nickname
        }
    }
}

/// Session settings chosen by the group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub mood: Option<String>,
    pub situation: Option<String>,
    pub mic_count: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mood: None,
            situation: None,
            mic_count: 1,
        }
    }
}

impl Settings {
    /// Microphone count with non-positive values clamped to 1
    pub fn mic_slots(&self) -> usize {
        usize::try_from(self.mic_count.max(1)).unwrap_or(usize::MAX)
    }
}

/// Incoming recommendation request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub members: Vec<Participant>,
    #[serde(default)]
    pub settings: Option<Settings>,
}

/// Result of a single-song recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub selected_song: SongSummary,
    pub selected_singers: Vec<Participant>,
}
