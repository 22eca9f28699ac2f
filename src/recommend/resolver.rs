//! Group and settings -> target attributes for scoring.
//!
//! Everything here is a pure function of its inputs except the mood-class
//! draw, which takes the caller's RNG.

use crate::catalog::normalize::{decade_label, normalize_query, normalize_tag};
use crate::models::{Gender, Participant, Settings};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Era used for an empty group and for ages outside the table
pub const DEFAULT_ERA: i32 = 2020;

/// (min age, max age, era): the decade a participant spent their late teens
/// and twenties in, capped at the current decade.
const AGE_TO_ERA: [(u32, u32, i32); 10] = [
    (0, 9, 2020),
    (10, 19, 2020),
    (20, 29, 2020),
    (30, 39, 2010),
    (40, 49, 2000),
    (50, 59, 1990),
    (60, 69, 1980),
    (70, 79, 1970),
    (80, 89, 1960),
    (90, 100, 1950),
];

/// Distinct eras the table can produce, ascending
pub fn era_buckets() -> Vec<i32> {
    let mut eras: Vec<i32> = AGE_TO_ERA.iter().map(|&(_, _, era)| era).collect();
    eras.sort_unstable();
    eras.dedup();
    eras
}

/// Gender make-up of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAffinity {
    MaleOnly,
    Mixed,
    FemaleOnly,
}

/// Coarse mood bucket picked from the situation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodClass {
    Upbeat,
    Energetic,
    Mellow,
    Relaxed,
    Any,
}

impl MoodClass {
    pub const ALL: [MoodClass; 5] = [
        MoodClass::Upbeat,
        MoodClass::Energetic,
        MoodClass::Mellow,
        MoodClass::Relaxed,
        MoodClass::Any,
    ];

    /// Catalog tag this class filters on; `Any` imposes no mood
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            MoodClass::Upbeat => Some("upbeat"),
            MoodClass::Energetic => Some("energetic"),
            MoodClass::Mellow => Some("mellow"),
            MoodClass::Relaxed => Some("relaxed"),
            MoodClass::Any => None,
        }
    }
}

/// Who the group is singing with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Situation {
    Friends,
    Coworkers,
    Partner,
    Family,
}

impl Situation {
    /// Match against the known English and Japanese labels
    pub fn parse(raw: &str) -> Option<Self> {
        let value = normalize_tag(raw);
        if value == "friends" || value == "友人と" {
            Some(Situation::Friends)
        } else if value == "coworkers" || value == "会社の人と" {
            Some(Situation::Coworkers)
        } else if value == "partner" || value == "恋人と" {
            Some(Situation::Partner)
        } else if value == "family" || value == "家族と" {
            Some(Situation::Family)
        } else {
            None
        }
    }

    pub fn mood_candidates(&self) -> &'static [MoodClass] {
        match self {
            Situation::Friends | Situation::Coworkers => {
                &[MoodClass::Upbeat, MoodClass::Energetic]
            }
            Situation::Partner => &[MoodClass::Mellow, MoodClass::Relaxed],
            Situation::Family => &[MoodClass::Any],
        }
    }
}

/// Share of each gender in a group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenderDistribution {
    pub male: f64,
    pub female: f64,
    pub other: f64,
}

/// What the scorer should aim for
#[derive(Debug, Clone, PartialEq)]
pub struct TargetAttributes {
    /// First year of the target decade
    pub era: i32,
    pub gender_affinity: GroupAffinity,
    pub mood_class: MoodClass,
    /// Normalized mood tag used for filtering and scoring
    pub mood: Option<String>,
    /// Normalized situation tag used for filtering and scoring
    pub situation: Option<String>,
}

impl TargetAttributes {
    pub fn decade(&self) -> String {
        decade_label(self.era)
    }
}

/// Attribute resolution using static helper functions
pub struct AttributeResolver;

impl AttributeResolver {
    /// Era for a single participant
    pub fn era_for_age(age: u32) -> i32 {
        AGE_TO_ERA
            .iter()
            .find(|&&(min_age, max_age, _)| (min_age..=max_age).contains(&age))
            .map(|&(_, _, era)| era)
            .unwrap_or(DEFAULT_ERA)
    }

    /// Mean of the per-participant eras, floored to a 10-year boundary
    pub fn target_era(participants: &[Participant]) -> i32 {
        if participants.is_empty() {
            return DEFAULT_ERA;
        }

        let sum: i64 = participants
            .iter()
            .map(|p| i64::from(Self::era_for_age(p.age)))
            .sum();
        let count = participants.len() as i64;

        // Eras are positive, so integer division floors the mean
        let era = (sum / (count * 10)) * 10;
        i32::try_from(era).unwrap_or(DEFAULT_ERA)
    }

    /// Male-only, female-only or mixed; `Other` does not count either way
    pub fn gender_affinity(participants: &[Participant]) -> GroupAffinity {
        let has_male = participants.iter().any(|p| p.gender == Gender::Male);
        let has_female = participants.iter().any(|p| p.gender == Gender::Female);

        match (has_male, has_female) {
            (true, false) => GroupAffinity::MaleOnly,
            (false, true) => GroupAffinity::FemaleOnly,
            _ => GroupAffinity::Mixed,
        }
    }

    pub fn gender_distribution(participants: &[Participant]) -> GenderDistribution {
        if participants.is_empty() {
            return GenderDistribution {
                male: 0.5,
                female: 0.5,
                other: 0.0,
            };
        }

        let total = participants.len() as f64;
        let share = |gender: Gender| {
            participants.iter().filter(|p| p.gender == gender).count() as f64 / total
        };

        GenderDistribution {
            male: share(Gender::Male),
            female: share(Gender::Female),
            other: share(Gender::Other),
        }
    }

    /// Draw a mood class from the situation's candidates, or from every class
    /// when the situation is unknown
    pub fn mood_class<R: Rng + ?Sized>(situation: Option<&str>, rng: &mut R) -> MoodClass {
        let candidates = situation
            .and_then(Situation::parse)
            .map(|s| s.mood_candidates())
            .unwrap_or(&MoodClass::ALL[..]);

        candidates.choose(rng).copied().unwrap_or(MoodClass::Any)
    }

    /// Resolve every target attribute for a request
    pub fn resolve<R: Rng + ?Sized>(
        participants: &[Participant],
        settings: &Settings,
        rng: &mut R,
    ) -> TargetAttributes {
        let era = Self::target_era(participants);
        let gender_affinity = Self::gender_affinity(participants);
        let mood_class = Self::mood_class(settings.situation.as_deref(), rng);

        // An explicit mood wins over the class drawn from the situation
        let mood = normalize_query(settings.mood.as_deref())
            .or_else(|| mood_class.tag().map(str::to_string));
        let situation = normalize_query(settings.situation.as_deref());

        debug!(
            "Resolved targets: era={}, affinity={:?}, mood_class={:?}, mood={:?}, situation={:?}, distribution={:?}",
            era,
            gender_affinity,
            mood_class,
            mood,
            situation,
            Self::gender_distribution(participants)
        );

        TargetAttributes {
            era,
            gender_affinity,
            mood_class,
            mood,
            situation,
        }
    }
}
