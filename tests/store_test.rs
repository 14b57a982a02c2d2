//! Integration tests for the persisted store and the session completion flow

use chrono::{DateTime, Utc};
use rand::Rng;
use sakina_companion::core::{generate, BioTrendConfig};
use sakina_companion::session::{SessionRunner, PREROLL_SECS};
use sakina_companion::store::types::{
    BioPatch, BioStatus, InterventionKind, Language, Mood, NewInterventionLog, NewJournalEntry,
    NudgeKind, NudgePatch, Theme, BASELINE_LOAD,
};
use sakina_companion::store::{FileSlot, MemorySlot, Store, StoreError, StoreEvent};
use std::collections::HashSet;
use tempfile::TempDir;

fn file_store(dir: &TempDir) -> Store {
    Store::open(FileSlot::new(dir.path(), "sakina-store"))
}

fn assert_histories_well_formed(store: &Store) {
    let state = store.snapshot();

    let journal: Vec<DateTime<Utc>> = state.journal_history.iter().map(|e| e.timestamp).collect();
    assert!(journal.windows(2).all(|w| w[0] >= w[1]), "journal not newest-first");
    let ids: HashSet<&str> = state.journal_history.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids.len(), state.journal_history.len());
    assert!(ids.iter().all(|id| !id.is_empty()));

    let logs: Vec<DateTime<Utc>> = state
        .intervention_history
        .iter()
        .map(|l| l.timestamp)
        .collect();
    assert!(logs.windows(2).all(|w| w[0] >= w[1]), "interventions not newest-first");
    let ids: HashSet<&str> = state
        .intervention_history
        .iter()
        .map(|l| l.id.as_str())
        .collect();
    assert_eq!(ids.len(), state.intervention_history.len());
}

#[test]
fn test_create_text_entry_scenario() {
    let dir = TempDir::new().unwrap();
    let mut store = file_store(&dir);
    store
        .add_journal_entry(NewJournalEntry::text("Earlier", Some(Mood::Calm)))
        .unwrap();

    let before = Utc::now();
    let entry = store
        .add_journal_entry(NewJournalEntry::text(
            "Feeling overwhelmed",
            Some(Mood::Stressed),
        ))
        .unwrap();

    let first = &store.snapshot().journal_history[0];
    assert_eq!(first, &entry);
    assert_eq!(first.content, "Feeling overwhelmed");
    assert_eq!(first.mood, Some(Mood::Stressed));
    assert!(first.timestamp >= before);
    assert_ne!(first.id, store.snapshot().journal_history[1].id);
}

#[test]
fn test_random_action_sequences_keep_histories_ordered() {
    let dir = TempDir::new().unwrap();
    let mut store = file_store(&dir);
    let mut rng = rand::thread_rng();
    let moods = Mood::ALL;

    for _ in 0..200 {
        match rng.gen_range(0..6) {
            0 | 1 => {
                let mood = moods[rng.gen_range(0..moods.len())];
                store
                    .add_journal_entry(NewJournalEntry::text("entry", Some(mood)))
                    .unwrap();
            }
            2 => {
                store
                    .add_journal_entry(NewJournalEntry::voice(rng.gen_range(1..120), None))
                    .unwrap();
            }
            3 => {
                let history = &store.snapshot().journal_history;
                if !history.is_empty() {
                    let id = history[rng.gen_range(0..history.len())].id.clone();
                    assert!(store.delete_journal_entry(&id).unwrap());
                }
            }
            4 => {
                store
                    .log_intervention(NewInterventionLog {
                        kind: InterventionKind::ALL[rng.gen_range(0..3)],
                        sub_type: None,
                        duration_seconds: rng.gen_range(0..600),
                        completed: rng.gen_bool(0.8),
                    })
                    .unwrap();
            }
            _ => {
                store
                    .update_bio_status(BioPatch {
                        current_load: Some(rng.gen_range(0..=100)),
                        status: None,
                    })
                    .unwrap();
            }
        }
        assert_histories_well_formed(&store);
    }

    // The file holds exactly what the live store holds
    let reopened = file_store(&dir);
    assert_eq!(reopened.snapshot(), store.snapshot());
}

#[test]
fn test_dismiss_nudge_resets_bio_from_any_state() {
    let dir = TempDir::new().unwrap();
    let mut store = file_store(&dir);

    for load in [0_u8, 29, 61, 95, 100] {
        store
            .update_bio_status(BioPatch {
                current_load: Some(load),
                status: None,
            })
            .unwrap();
        if load % 2 == 1 {
            store
                .trigger_nudge(NudgePatch::new("Take a break", NudgeKind::Grounding))
                .unwrap();
        }

        store.dismiss_nudge().unwrap();
        let state = store.snapshot();
        assert!(!state.nudge.active);
        assert_eq!(state.bio_status.current_load, BASELINE_LOAD);
        assert_eq!(state.bio_status.status, BioStatus::Optimal);
    }
}

#[test]
fn test_trigger_nudge_twice_keeps_active() {
    let dir = TempDir::new().unwrap();
    let mut store = file_store(&dir);

    store
        .trigger_nudge(NudgePatch::new("Take a break", NudgeKind::Breathing))
        .unwrap();
    let nudge = &store.snapshot().nudge;
    assert!(nudge.active);
    assert_eq!(nudge.message, "Take a break");
    assert_eq!(nudge.kind, NudgeKind::Breathing);

    store
        .trigger_nudge(NudgePatch::new("Look around you", NudgeKind::Grounding))
        .unwrap();
    let nudge = &store.snapshot().nudge;
    assert!(nudge.active);
    assert_eq!(nudge.message, "Look around you");
    assert_eq!(nudge.kind, NudgeKind::Grounding);
}

#[test]
fn test_preferences_survive_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = file_store(&dir);
        store.set_theme(Theme::Dark).unwrap();
        store.set_language(Language::Ar).unwrap();
    }

    let store = file_store(&dir);
    assert_eq!(store.snapshot().preferences.theme, Theme::Dark);
    assert_eq!(store.snapshot().preferences.language, Language::Ar);
}

#[test]
fn test_corrupt_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("sakina-store.json"), "{ not json").unwrap();

    let mut store = file_store(&dir);
    assert!(store.snapshot().journal_history.is_empty());
    assert_eq!(store.snapshot().preferences.theme, Theme::Light);

    // The next action overwrites the corrupt file
    store.set_theme(Theme::System).unwrap();
    assert_eq!(file_store(&dir).snapshot().preferences.theme, Theme::System);
}

#[test]
fn test_failed_write_is_all_or_nothing() {
    let slot = MemorySlot::new("sakina-store");
    let mut store = Store::open(slot.clone());
    let events = store.subscribe();
    store
        .add_journal_entry(NewJournalEntry::text("kept", None))
        .unwrap();
    let before = store.snapshot().clone();
    let persisted = slot.contents();
    while events.try_recv().is_ok() {}

    slot.set_reject_writes(true);
    let result = store.add_journal_entry(NewJournalEntry::text("lost", None));
    assert!(matches!(result, Err(StoreError::WriteRejected(_))));
    assert!(store.dismiss_nudge().is_err());

    assert_eq!(store.snapshot(), &before);
    assert_eq!(slot.contents(), persisted);
    assert!(events.try_recv().is_err());
}

#[test]
fn test_completed_session_is_logged() {
    let dir = TempDir::new().unwrap();
    let mut store = file_store(&dir);
    let events = store.subscribe();

    let mut runner = SessionRunner::for_id("box-breathing", 60).unwrap();
    let now = Utc::now();
    for _ in 0..PREROLL_SECS + 32 {
        runner.tick(now);
    }
    let completion = runner.end(now).unwrap();
    assert_eq!(completion.duration_seconds, 32);

    let log = store.log_intervention(completion.to_log()).unwrap();
    assert_eq!(store.snapshot().intervention_history[0], log);
    assert_eq!(log.sub_type.as_deref(), Some("box-breathing"));
    assert!(log.completed);
    assert_eq!(events.try_recv().unwrap(), StoreEvent::InterventionLogged(log));
}

#[test]
fn test_bio_trends_properties() {
    let config = BioTrendConfig::default();
    for days in [7_u32, 30] {
        let points = generate(days, chrono_tz::Tz::UTC, &config);
        assert_eq!(points.len(), (days * 24 + 1) as usize);
        assert!(points.iter().all(|p| p.bio_load <= 100));
        let annotated = points.iter().filter(|p| p.intervention.is_some()).count();
        assert_eq!(annotated, ((days as f64 / 7.0) * 3.0).round() as usize);
    }
}
