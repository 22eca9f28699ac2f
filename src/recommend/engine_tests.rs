#[cfg(test)]
mod tests {
    use super::super::resolver::{
        AttributeResolver, DEFAULT_ERA, GroupAffinity, MoodClass, Situation, era_buckets,
    };
    use super::super::singers::{SingerAssigner, SungCounts};
    use super::super::*;
    use crate::catalog::SongCatalog;
    use crate::error::{ErrorResponse, KaraokeError};
    use crate::models::{
        Gender, GenderAffinity, Participant, RecommendationRequest, RecommendationResponse,
        Settings, Song,
    };
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::{HashMap, HashSet};
    use std::io::Write;
    use std::sync::Arc;

    fn member(id: &str, gender: Gender, age: u32) -> Participant {
        Participant::new(id, &format!("member-{id}"), gender, age)
    }

    fn create_mock_song(title: &str, year: i32, moods: &[&str], gender: GenderAffinity) -> Song {
        Song::new(
            title,
            "Mock Artist",
            year,
            "Pop",
            moods.iter().copied(),
            ["friends"],
            gender,
        )
        .unwrap()
    }

    fn create_test_catalog(size: usize) -> SongCatalog {
        SongCatalog::new((0..size).map(|i| {
            let gender = match i % 3 {
                0 => GenderAffinity::Male,
                1 => GenderAffinity::Female,
                _ => GenderAffinity::Unisex,
            };
            create_mock_song(&format!("Song {i}"), 1970 + (i as i32 * 7) % 55, &["upbeat"], gender)
        }))
    }

    fn seeded_engine(catalog: SongCatalog) -> RecommendationEngine {
        let config = EngineConfig {
            seed: Some(1234),
            ..EngineConfig::default()
        };
        RecommendationEngine::new(Arc::new(catalog), config).unwrap()
    }

    fn request(members: Vec<Participant>, settings: Option<Settings>) -> RecommendationRequest {
        RecommendationRequest { members, settings }
    }

    // Attribute resolution

    #[test]
    fn test_era_for_age_table() {
        assert_eq!(AttributeResolver::era_for_age(0), 2020);
        assert_eq!(AttributeResolver::era_for_age(25), 2020);
        assert_eq!(AttributeResolver::era_for_age(35), 2010);
        assert_eq!(AttributeResolver::era_for_age(49), 2000);
        assert_eq!(AttributeResolver::era_for_age(50), 1990);
        assert_eq!(AttributeResolver::era_for_age(95), 1950);
        assert_eq!(AttributeResolver::era_for_age(100), 1950);
        // Outside the table falls back to the most recent era
        assert_eq!(AttributeResolver::era_for_age(130), DEFAULT_ERA);
    }

    #[test]
    fn test_target_era_averages_eras_then_floors() {
        // 2020 and 1990 average to 2005, floored to 2000
        let group = vec![member("1", Gender::Male, 25), member("2", Gender::Female, 50)];
        assert_eq!(AttributeResolver::target_era(&group), 2000);

        // 1990 and 1980 average to 1985, floored to 1980
        let group = vec![member("1", Gender::Male, 59), member("2", Gender::Male, 60)];
        assert_eq!(AttributeResolver::target_era(&group), 1980);

        // Eras are averaged, not ages: 2020 and 1950 give 1985, floored to 1980
        let group = vec![member("1", Gender::Male, 18), member("2", Gender::Male, 92)];
        assert_eq!(AttributeResolver::target_era(&group), 1980);

        assert_eq!(AttributeResolver::target_era(&[]), DEFAULT_ERA);
    }

    #[test]
    fn test_target_era_is_always_a_bucket_value() {
        let buckets = era_buckets();
        let ages = [0, 8, 19, 27, 33, 41, 52, 64, 71, 88, 99, 120];

        for (i, &a) in ages.iter().enumerate() {
            for &b in &ages[i..] {
                for &c in &ages {
                    let group = vec![
                        member("a", Gender::Other, a),
                        member("b", Gender::Other, b),
                        member("c", Gender::Other, c),
                    ];
                    let era = AttributeResolver::target_era(&group);
                    assert!(buckets.contains(&era), "era {era} for ages {a},{b},{c}");
                }
            }
        }
    }

    #[test]
    fn test_gender_affinity_resolution() {
        let mut group = vec![member("1", Gender::Male, 30), member("2", Gender::Other, 30)];
        assert_eq!(AttributeResolver::gender_affinity(&group), GroupAffinity::MaleOnly);

        group.push(member("3", Gender::Female, 30));
        assert_eq!(AttributeResolver::gender_affinity(&group), GroupAffinity::Mixed);

        let women = vec![member("1", Gender::Female, 30), member("2", Gender::Female, 40)];
        assert_eq!(AttributeResolver::gender_affinity(&women), GroupAffinity::FemaleOnly);

        let others = vec![member("1", Gender::Other, 30)];
        assert_eq!(AttributeResolver::gender_affinity(&others), GroupAffinity::Mixed);
        assert_eq!(AttributeResolver::gender_affinity(&[]), GroupAffinity::Mixed);
    }

    #[test]
    fn test_gender_distribution() {
        let group = vec![
            member("1", Gender::Male, 30),
            member("2", Gender::Female, 30),
            member("3", Gender::Female, 30),
            member("4", Gender::Other, 30),
        ];
        let distribution = AttributeResolver::gender_distribution(&group);
        assert_relative_eq!(distribution.male, 0.25);
        assert_relative_eq!(distribution.female, 0.5);
        assert_relative_eq!(distribution.other, 0.25);

        let empty = AttributeResolver::gender_distribution(&[]);
        assert_relative_eq!(empty.male, 0.5);
        assert_relative_eq!(empty.female, 0.5);
    }

    #[test]
    fn test_situation_parsing_uses_explicit_labels() {
        assert_eq!(Situation::parse(" Friends "), Some(Situation::Friends));
        assert_eq!(Situation::parse("友人と"), Some(Situation::Friends));
        assert_eq!(Situation::parse("会社の人と"), Some(Situation::Coworkers));
        assert_eq!(Situation::parse("恋人と"), Some(Situation::Partner));
        assert_eq!(Situation::parse("家族と"), Some(Situation::Family));
        assert_eq!(Situation::parse("party"), None);
        assert_eq!(Situation::parse(""), None);
    }

    #[test]
    fn test_mood_class_follows_situation() {
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let friends = AttributeResolver::mood_class(Some("友人と"), &mut rng);
            assert!(matches!(friends, MoodClass::Upbeat | MoodClass::Energetic));

            let partner = AttributeResolver::mood_class(Some("partner"), &mut rng);
            assert!(matches!(partner, MoodClass::Mellow | MoodClass::Relaxed));

            let family = AttributeResolver::mood_class(Some("family"), &mut rng);
            assert_eq!(family, MoodClass::Any);
        }

        let unknown: HashSet<_> = (0..60)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                format!("{:?}", AttributeResolver::mood_class(None, &mut rng))
            })
            .collect();
        assert!(unknown.len() >= 3, "unknown situation drew only {unknown:?}");

        let draw = |seed: u64| {
            AttributeResolver::mood_class(Some("coworkers"), &mut StdRng::seed_from_u64(seed))
        };
        assert_eq!(draw(9), draw(9));
    }

    #[test]
    fn test_resolve_prefers_explicit_mood() {
        let group = vec![member("1", Gender::Female, 50)];
        let settings = Settings {
            mood: Some(" Energetic ".to_string()),
            situation: Some("Partner".to_string()),
            mic_count: 1,
        };
        let mut rng = StdRng::seed_from_u64(5);
        let target = AttributeResolver::resolve(&group, &settings, &mut rng);

        assert_eq!(target.era, 1990);
        assert_eq!(target.decade(), "1990s");
        assert_eq!(target.gender_affinity, GroupAffinity::FemaleOnly);
        assert_eq!(target.mood.as_deref(), Some("energetic"));
        assert_eq!(target.situation.as_deref(), Some("partner"));

        let settings = Settings {
            mood: None,
            ..settings
        };
        let target = AttributeResolver::resolve(&group, &settings, &mut rng);
        assert!(matches!(target.mood.as_deref(), Some("mellow") | Some("relaxed")));
    }

    #[test]
    fn test_resolve_empty_group_and_settings() {
        let mut rng = StdRng::seed_from_u64(11);
        let target = AttributeResolver::resolve(&[], &Settings::default(), &mut rng);

        assert_eq!(target.era, DEFAULT_ERA);
        assert_eq!(target.gender_affinity, GroupAffinity::Mixed);
        assert!(SingerAssigner::assign(&[], 2, &mut rng).is_empty());
    }

    // Singer assignment

    #[test]
    fn test_assign_more_mics_than_members_returns_everyone_once() {
        let group = vec![
            member("1", Gender::Male, 20),
            member("2", Gender::Female, 30),
            member("3", Gender::Other, 40),
        ];
        let mut rng = StdRng::seed_from_u64(2);

        let singers = SingerAssigner::assign(&group, 5, &mut rng);
        let mut ids: Vec<&str> = singers.iter().map(|p| p.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_assign_clamps_mic_count() {
        let group = vec![member("1", Gender::Male, 20), member("2", Gender::Female, 30)];
        let mut rng = StdRng::seed_from_u64(2);

        for mic_count in [0, -4, 1] {
            let settings = Settings {
                mic_count,
                ..Settings::default()
            };
            assert_eq!(settings.mic_slots(), 1);
            assert_eq!(SingerAssigner::assign(&group, settings.mic_slots(), &mut rng).len(), 1);
        }

        let pair = SingerAssigner::assign(&group, 2, &mut rng);
        assert_eq!(pair.len(), 2);
        assert_ne!(pair[0].id, pair[1].id);
    }

    #[test]
    fn test_fairness_never_favors_busier_singer() {
        let assigner = SingerAssigner::new(SingerWeights::default());
        let song = create_mock_song("Duet", 2020, &[], GenderAffinity::Unisex);
        let rested = member("rested", Gender::Male, 25);
        let busy = member("busy", Gender::Male, 25);

        let mut ledger = SungCounts::new(&[rested.clone(), busy.clone()]);
        let fresh = assigner.score_participant(&song, &rested, ledger.get(0), ledger.max());
        assert_relative_eq!(fresh.fairness, 30.0);

        ledger.record(1);
        ledger.record(1);
        assert_eq!(ledger.counts(), &[0, 2]);
        let rested_score = assigner.score_participant(&song, &rested, ledger.get(0), ledger.max());
        let busy_score = assigner.score_participant(&song, &busy, ledger.get(1), ledger.max());

        assert!(rested_score.fairness > busy_score.fairness);
        assert!(rested_score.total() > busy_score.total());
        assert_relative_eq!(busy_score.fairness, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_choose_singer_matches_voice_among_least_sung() {
        let assigner = SingerAssigner::new(SingerWeights::default());
        let song = create_mock_song("Power Ballad", 2021, &[], GenderAffinity::Female);
        let group = vec![member("m", Gender::Male, 25), member("f", Gender::Female, 25)];
        let mut rng = StdRng::seed_from_u64(4);

        let ledger = SungCounts::new(&group);
        let choice = assigner.choose_singer(&song, &group, &ledger, &mut rng).unwrap();
        assert_eq!(choice.participant.id, "f");
        assert_eq!(choice.index, 1);
        assert!(choice.reason.contains("voice matches the song"));
        assert!(choice.reason.contains("has not sung yet"));

        // Once she has sung, the other member gets the turn despite the mismatch
        let mut ledger = SungCounts::new(&group);
        ledger.record(1);
        let choice = assigner.choose_singer(&song, &group, &ledger, &mut rng).unwrap();
        assert_eq!(choice.participant.id, "m");

        assert!(assigner.choose_singer(&song, &[], &ledger, &mut rng).is_none());
    }

    #[test]
    fn test_choose_singer_keeps_namesakes_apart() {
        let assigner = SingerAssigner::new(SingerWeights::default());
        let song = create_mock_song("Anthem", 2021, &[], GenderAffinity::Male);
        let group = vec![
            Participant::new("", "", Gender::Male, 25),
            Participant::new("", "", Gender::Female, 70),
        ];
        let mut rng = StdRng::seed_from_u64(8);

        let mut ledger = SungCounts::new(&group);
        let first = assigner.choose_singer(&song, &group, &ledger, &mut rng).unwrap();
        assert_eq!(first.index, 0);
        ledger.record(first.index);

        let second = assigner.choose_singer(&song, &group, &ledger, &mut rng).unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.participant.age, 70);
    }

    #[test]
    fn test_fairness_weight_does_not_change_choice() {
        let song = create_mock_song("Ballad", 1994, &[], GenderAffinity::Female);
        let group = vec![
            member("1", Gender::Male, 55),
            member("2", Gender::Female, 22),
            member("3", Gender::Female, 52),
        ];
        let heavy = SingerAssigner::new(SingerWeights {
            fairness: 90.0,
            ..SingerWeights::default()
        });
        let none = SingerAssigner::new(SingerWeights {
            fairness: 0.0,
            ..SingerWeights::default()
        });

        let mut ledger = SungCounts::new(&group);
        for _ in 0..6 {
            let pick = |assigner: &SingerAssigner| {
                let mut rng = StdRng::seed_from_u64(21);
                assigner.choose_singer(&song, &group, &ledger, &mut rng).unwrap().index
            };
            let index = pick(&heavy);
            assert_eq!(index, pick(&none));
            ledger.record(index);
        }
        assert_eq!(ledger.counts(), &[2, 2, 2]);
    }

    // Engine

    #[test]
    fn test_recommend_scenario_single_song() {
        let catalog = SongCatalog::new(vec![create_mock_song(
            "Song A",
            1999,
            &["energetic"],
            GenderAffinity::Unisex,
        )]);
        let engine = seeded_engine(catalog);
        let req = request(
            vec![member("1", Gender::Other, 50)],
            Some(Settings {
                mood: Some("energetic".to_string()),
                situation: None,
                mic_count: 1,
            }),
        );

        let response = engine.recommend(&req).unwrap();
        assert_eq!(response.selected_song.title, "Song A");
        assert_eq!(response.selected_song.year, 1999);
        assert_eq!(response.selected_singers.len(), 1);
    }

    #[test]
    fn test_recommend_is_reproducible_with_seed() {
        let engine = seeded_engine(create_test_catalog(40));
        let req = request(
            vec![
                member("1", Gender::Male, 22),
                member("2", Gender::Female, 47),
                member("3", Gender::Other, 63),
            ],
            Some(Settings {
                mood: None,
                situation: Some("友人と".to_string()),
                mic_count: 2,
            }),
        );

        let first = engine.recommend(&req).unwrap();
        let second = engine.recommend(&req).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.selected_singers.len(), 2);
    }

    #[test]
    fn test_recommend_rejects_empty_members() {
        let engine = seeded_engine(create_test_catalog(3));
        let err = engine.recommend(&request(vec![], None)).unwrap_err();

        assert!(matches!(err, KaraokeError::EmptyInput(_)));
        assert!(err.is_user_error());
        assert_eq!(
            ErrorResponse::from(&err),
            ErrorResponse {
                error: "Members are required".to_string(),
                details: None,
            }
        );
    }

    #[test]
    fn test_recommend_without_settings_uses_defaults() {
        let engine = seeded_engine(create_test_catalog(5));
        let req = request(vec![member("1", Gender::Male, 30), member("2", Gender::Male, 31)], None);

        let response = engine.recommend(&req).unwrap();
        assert_eq!(response.selected_singers.len(), 1);
    }

    #[test]
    fn test_recommend_empty_catalog_fails() {
        let engine = seeded_engine(SongCatalog::default());
        let err = engine
            .recommend(&request(vec![member("1", Gender::Male, 30)], None))
            .unwrap_err();
        assert!(matches!(err, KaraokeError::EmptyCatalog));
    }

    #[test]
    fn test_setlist_spreads_turns_evenly() {
        let engine = seeded_engine(create_test_catalog(30));
        let group = vec![
            member("1", Gender::Male, 21),
            member("2", Gender::Female, 34),
            member("3", Gender::Male, 48),
            member("4", Gender::Other, 57),
            member("5", Gender::Female, 66),
        ];
        let num_songs = 12;
        let floor = num_songs / group.len();

        let setlist = engine
            .create_setlist(&request(group.clone(), None), Some(num_songs))
            .unwrap();
        assert_eq!(setlist.entries.len(), num_songs);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for (i, entry) in setlist.entries.iter().enumerate() {
            assert_eq!(entry.order, i + 1);
            assert!(!entry.reason.is_empty());

            // Nobody gets an extra turn while someone is still below the floor
            let before = counts.get(&entry.singer.id).copied().unwrap_or(0);
            if before + 1 > floor {
                assert!(
                    group.iter().all(|p| counts.get(&p.id).copied().unwrap_or(0) >= floor),
                    "{} got turn {} before everyone had {floor}",
                    entry.singer.id,
                    before + 1
                );
            }
            *counts.entry(entry.singer.id.clone()).or_insert(0) += 1;
        }

        assert!(group.iter().all(|p| counts.get(&p.id).copied().unwrap_or(0) >= floor));

        let unique_titles: HashSet<&str> =
            setlist.entries.iter().map(|e| e.song.title.as_str()).collect();
        assert_eq!(unique_titles.len(), num_songs);

        assert_eq!(setlist.metadata.total_songs, num_songs);
        assert_eq!(setlist.metadata.songs_per_singer.values().sum::<usize>(), num_songs);
        assert!(setlist.metadata.average_score > 0.0);
    }

    #[test]
    fn test_setlist_fair_for_members_without_identity() {
        let catalog = SongCatalog::new(
            (0..6).map(|i| create_mock_song(&format!("Rock {i}"), 2020 + i, &[], GenderAffinity::Male)),
        );
        let engine = seeded_engine(catalog);
        let req: RecommendationRequest = serde_json::from_str(
            r#"{"members": [{"gender": "male", "age": 25}, {"gender": "female", "age": 70}]}"#,
        )
        .unwrap();

        let setlist = engine.create_setlist(&req, Some(6)).unwrap();
        let ages: Vec<u32> = setlist.entries.iter().map(|e| e.singer.age).collect();
        assert_eq!(ages.iter().filter(|&&age| age == 25).count(), 3);
        assert_eq!(ages.iter().filter(|&&age| age == 70).count(), 3);
        assert_eq!(setlist.metadata.songs_per_singer.len(), 2);
    }

    #[test]
    fn test_setlist_fair_for_duplicate_ids() {
        let engine = seeded_engine(create_test_catalog(20));
        let group = vec![
            member("1", Gender::Male, 25),
            member("1", Gender::Male, 25),
            member("1", Gender::Female, 60),
        ];

        let setlist = engine.create_setlist(&request(group, None), Some(9)).unwrap();
        let mut turns = [0; 3];
        for entry in &setlist.entries {
            turns[entry.singer_index] += 1;
        }
        assert_eq!(turns, [3, 3, 3]);
        assert_eq!(
            setlist.metadata.songs_per_singer.values().copied().collect::<Vec<_>>(),
            vec![3, 3, 3]
        );
    }

    #[test]
    fn test_setlist_shortened_by_small_catalog_and_default_length() {
        let engine = seeded_engine(create_test_catalog(4));
        let req = request(vec![member("1", Gender::Male, 30)], None);

        let setlist = engine.create_setlist(&req, Some(10)).unwrap();
        assert_eq!(setlist.entries.len(), 4);
        assert!(setlist.entries.iter().all(|e| e.singer.id == "1"));

        let engine = seeded_engine(create_test_catalog(20));
        let setlist = engine.create_setlist(&req, None).unwrap();
        assert_eq!(setlist.entries.len(), EngineConfig::default().default_setlist_length);
    }

    // Wire format

    #[test]
    fn test_request_and_response_json_shape() {
        let raw = r#"{
            "members": [
                {"id": "1", "nickname": "太郎", "gender": "male", "age": 25},
                {"id": "2", "nickname": "Kai", "gender": "nonbinary", "age": 31}
            ],
            "settings": {"mood": "upbeat", "situation": "party", "micCount": 2}
        }"#;
        let req: RecommendationRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.members[1].gender, Gender::Other);
        let settings = req.settings.clone().unwrap();
        assert_eq!(settings.mic_count, 2);
        assert_eq!(settings.mic_slots(), 2);

        let partial: Settings = serde_json::from_str(r#"{"mood": "chill"}"#).unwrap();
        assert_eq!(partial.mic_count, 1);

        let response = RecommendationResponse {
            selected_song: create_mock_song("Song", 2001, &[], GenderAffinity::Unisex).summary(),
            selected_singers: req.members.clone(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["selectedSong"]["title"], "Song");
        assert_eq!(json["selectedSong"]["year"], 2001);
        assert_eq!(json["selectedSingers"][0]["nickname"], "太郎");
        assert_eq!(json["selectedSingers"][1]["gender"], "other");
    }

    #[test]
    fn test_setlist_entry_json_shape() {
        let engine = seeded_engine(create_test_catalog(3));
        let setlist = engine
            .create_setlist(&request(vec![member("1", Gender::Female, 40)], None), Some(2))
            .unwrap();

        let json = serde_json::to_value(&setlist.entries).unwrap();
        let first = &json[0];
        assert_eq!(first["order"], 1);
        assert!(first["song"]["title"].is_string());
        assert_eq!(first["singer"]["id"], "1");
        assert!(first["reason"].is_string());
        assert!(first.get("song_score").is_none());
    }

    // Configuration

    #[test]
    fn test_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());

        let mut heavy = EngineConfig::default();
        heavy.scoring_weights.era = 50.0;
        assert!(matches!(heavy.validate(), Err(KaraokeError::Config(_))));

        let mut negative = EngineConfig::default();
        negative.singer_weights.fairness = -1.0;
        assert!(matches!(negative.validate(), Err(KaraokeError::Config(_))));

        let mut ratio = EngineConfig::default();
        ratio.partial_match_ratio = 1.5;
        assert!(ratio.validate().is_err());

        let result = RecommendationEngine::new(Arc::new(SongCatalog::default()), heavy);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_from_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"seed": 99, "scoring_weights": {{"era": 50, "gender": 20, "mood": 15, "situation": 15}}}}"#
        )
        .unwrap();

        let config = EngineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.seed, Some(99));
        assert_relative_eq!(config.scoring_weights.era, 50.0);
        assert_eq!(config.singer_weights, SingerWeights::default());
        assert_eq!(config.default_setlist_length, 10);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        write!(broken, "not json").unwrap();
        assert!(matches!(
            EngineConfig::load_from_file(broken.path()),
            Err(KaraokeError::Config(_))
        ));
    }
}
