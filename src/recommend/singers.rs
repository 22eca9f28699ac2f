use super::config::SingerWeights;
use super::resolver::AttributeResolver;
use crate::models::{Gender, GenderAffinity, Participant, Song};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

/// How many songs each participant has been given within one setlist call.
///
/// Indexed by position in the member list, so members sharing an id or
/// nickname (or having none) still keep separate counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SungCounts {
    counts: Vec<u32>,
}

impl SungCounts {
    pub fn new(participants: &[Participant]) -> Self {
        Self {
            counts: vec![0; participants.len()],
        }
    }

    pub fn get(&self, index: usize) -> u32 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    pub fn record(&mut self, index: usize) {
        if index >= self.counts.len() {
            self.counts.resize(index + 1, 0);
        }
        self.counts[index] += 1;
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Counts in member order
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}

/// How a participant's voice lines up with the song
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderFit {
    Any,
    Match,
    Mismatch,
}

/// Per-participant breakdown for one song
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingerScore {
    pub gender_fit: GenderFit,
    pub gender: f64,
    pub era: f64,
    pub fairness: f64,
    pub era_diff: i32,
    pub sung_count: u32,
}

impl SingerScore {
    pub fn total(&self) -> f64 {
        self.gender + self.era + self.fairness
    }
}

/// The primary singer picked for a song
#[derive(Debug, Clone, PartialEq)]
pub struct SingerChoice<'p> {
    /// Position in the member list
    pub index: usize,
    pub participant: &'p Participant,
    pub score: SingerScore,
    pub reason: String,
}

/// Assigns microphones and setlist singers
#[derive(Debug, Clone)]
pub struct SingerAssigner {
    weights: SingerWeights,
}

impl SingerAssigner {
    pub fn new(weights: SingerWeights) -> Self {
        Self { weights }
    }

    /// Random pick of up to `slots` distinct participants
    pub fn assign<R: Rng + ?Sized>(
        participants: &[Participant],
        slots: usize,
        rng: &mut R,
    ) -> Vec<Participant> {
        participants
            .choose_multiple(rng, slots.min(participants.len()))
            .cloned()
            .collect()
    }

    /// Score how well a participant fits a song, given their own turn count
    /// and the highest count in the group so far
    pub fn score_participant(
        &self,
        song: &Song,
        participant: &Participant,
        sung_count: u32,
        max_sung: u32,
    ) -> SingerScore {
        let weights = &self.weights;

        let gender_fit = match (song.gender_affinity(), participant.gender) {
            (GenderAffinity::Unisex, _) => GenderFit::Any,
            (GenderAffinity::Male, Gender::Male) | (GenderAffinity::Female, Gender::Female) => {
                GenderFit::Match
            }
            _ => GenderFit::Mismatch,
        };
        let gender = match gender_fit {
            GenderFit::Any => weights.gender * 0.75,
            GenderFit::Match => weights.gender,
            GenderFit::Mismatch => weights.gender * 0.25,
        };

        let participant_era = AttributeResolver::era_for_age(participant.age);
        let era_diff = (song.decade_start() - participant_era).abs();
        let era = if era_diff == 0 {
            weights.era
        } else if era_diff <= 10 {
            weights.era * 2.0 / 3.0
        } else if era_diff <= 20 {
            weights.era / 3.0
        } else {
            0.0
        };

        // Strictly decreasing in the participant's own count
        let fairness = if max_sung == 0 {
            weights.fairness
        } else {
            weights.fairness * (1.0 - f64::from(sung_count) / f64::from(max_sung + 1))
        };

        SingerScore {
            gender_fit,
            gender,
            era,
            fairness,
            era_diff,
            sung_count,
        }
    }

    /// Best singer for a song. Only participants with the fewest songs so far
    /// are eligible; among them the highest score wins, ties broken by the RNG.
    pub fn choose_singer<'p, R: Rng + ?Sized>(
        &self,
        song: &Song,
        participants: &'p [Participant],
        ledger: &SungCounts,
        rng: &mut R,
    ) -> Option<SingerChoice<'p>> {
        let fewest = (0..participants.len()).map(|i| ledger.get(i)).min()?;
        let max_sung = ledger.max();

        let scored: Vec<(usize, &'p Participant, SingerScore)> = participants
            .iter()
            .enumerate()
            .filter(|&(i, _)| ledger.get(i) == fewest)
            .map(|(i, p)| (i, p, self.score_participant(song, p, fewest, max_sung)))
            .collect();

        let best = scored
            .iter()
            .map(|(_, _, score)| score.total())
            .fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<&(usize, &'p Participant, SingerScore)> = scored
            .iter()
            .filter(|(_, _, score)| score.total() == best)
            .collect();

        let &&(index, participant, score) = tied.choose(rng)?;
        let reason = describe(&score);
        debug!(
            "Singer for '{}': {} (score {:.1}, {})",
            song.title(),
            participant.nickname,
            score.total(),
            reason
        );

        Some(SingerChoice {
            index,
            participant,
            score,
            reason,
        })
    }
}

fn describe(score: &SingerScore) -> String {
    let voice = match score.gender_fit {
        GenderFit::Any => "song suits any voice",
        GenderFit::Match => "voice matches the song",
        GenderFit::Mismatch => "taking on a cross-voice song",
    };

    let era = match score.era_diff {
        0 => "from their era",
        d if d <= 10 => "close to their era",
        d if d <= 20 => "near their era",
        _ => "outside their era",
    };

    let turns = match score.sung_count {
        0 => "has not sung yet".to_string(),
        1 => "sung once so far".to_string(),
        n => format!("sung {n} times so far"),
    };

    format!("{voice}, {era}, {turns}")
}
