//! The persisted application store.
//!
//! Every action builds the next snapshot from the current one, writes it to
//! the slot, and only then swaps it in and notifies subscribers. A failed
//! write leaves the live snapshot exactly as it was.

use crate::store::nudge::NudgeMachine;
use crate::store::slot::{StorageSlot, StoreError};
use crate::store::types::{
    BioDataPoint, BioPatch, BioStatus, EntryKind, InterventionLog, JournalEntry, Language,
    NewInterventionLog, NewJournalEntry, NotificationPatch, NudgePatch, NudgeState,
    SakinaStore, SubscriptionTier, Theme, UserPreferences,
};
use chrono::Utc;
use crossbeam_channel::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Change notification sent to subscribers after a successful action.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    PreferencesChanged(UserPreferences),
    JournalChanged,
    InterventionLogged(InterventionLog),
    BioStatusChanged(BioDataPoint),
    NudgeChanged(NudgeState),
}

/// Single source of truth for local companion state.
pub struct Store {
    slot: Box<dyn StorageSlot>,
    state: SakinaStore,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("slot", &self.slot.key())
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Store {
    /// Open the store on `slot`, falling back to defaults when the slot is
    /// empty, unreadable, or corrupt.
    pub fn open(slot: impl StorageSlot + 'static) -> Self {
        let state = load_state(&slot);
        Self {
            slot: Box::new(slot),
            state,
            subscribers: Vec::new(),
        }
    }

    /// Read-only view of the current state.
    pub fn snapshot(&self) -> &SakinaStore {
        &self.state
    }

    /// Receive a [`StoreEvent`] after every successful action. Dropping the
    /// receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        let mut next = self.state.clone();
        next.preferences.theme = theme;
        let event = StoreEvent::PreferencesChanged(next.preferences.clone());
        self.commit(next, vec![event])
    }

    pub fn set_language(&mut self, language: Language) -> Result<(), StoreError> {
        let mut next = self.state.clone();
        next.preferences.language = language;
        let event = StoreEvent::PreferencesChanged(next.preferences.clone());
        self.commit(next, vec![event])
    }

    pub fn update_notification_preferences(
        &mut self,
        patch: NotificationPatch,
    ) -> Result<(), StoreError> {
        let mut next = self.state.clone();
        let notifications = &mut next.preferences.notifications;
        if let Some(nudges) = patch.nudges {
            notifications.nudges = nudges;
        }
        if let Some(daily_reminder) = patch.daily_reminder {
            notifications.daily_reminder = daily_reminder;
        }
        let event = StoreEvent::PreferencesChanged(next.preferences.clone());
        self.commit(next, vec![event])
    }

    pub fn set_subscription(&mut self, tier: SubscriptionTier) -> Result<(), StoreError> {
        let mut next = self.state.clone();
        next.preferences.subscription = tier;
        let event = StoreEvent::PreferencesChanged(next.preferences.clone());
        self.commit(next, vec![event])
    }

    /// Add a journal entry at the front of the history with a fresh id and
    /// the current time.
    pub fn add_journal_entry(&mut self, entry: NewJournalEntry) -> Result<JournalEntry, StoreError> {
        if entry.kind == EntryKind::Text && entry.content.trim().is_empty() {
            return Err(StoreError::InvalidEntry(
                "text entries need some content".to_string(),
            ));
        }

        let created = JournalEntry {
            id: Uuid::new_v4().to_string(),
            kind: entry.kind,
            content: entry.content,
            mood: entry.mood,
            timestamp: Utc::now(),
        };

        let mut next = self.state.clone();
        next.journal_history.insert(0, created.clone());
        self.commit(next, vec![StoreEvent::JournalChanged])?;

        tracing::info!(id = %created.id, kind = %created.kind, "journal entry added");
        Ok(created)
    }

    /// Remove a journal entry. Returns whether anything was removed.
    pub fn delete_journal_entry(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut next = self.state.clone();
        let before = next.journal_history.len();
        next.journal_history.retain(|entry| entry.id != id);
        if next.journal_history.len() == before {
            return Ok(false);
        }

        self.commit(next, vec![StoreEvent::JournalChanged])?;
        Ok(true)
    }

    /// Record a finished intervention at the front of the history.
    pub fn log_intervention(
        &mut self,
        log: NewInterventionLog,
    ) -> Result<InterventionLog, StoreError> {
        let created = InterventionLog {
            id: Uuid::new_v4().to_string(),
            kind: log.kind,
            sub_type: log.sub_type,
            timestamp: Utc::now(),
            duration_seconds: log.duration_seconds,
            completed: log.completed,
        };

        let mut next = self.state.clone();
        next.intervention_history.insert(0, created.clone());
        self.commit(next, vec![StoreEvent::InterventionLogged(created.clone())])?;

        tracing::info!(
            kind = %created.kind,
            duration_seconds = created.duration_seconds,
            "intervention logged"
        );
        Ok(created)
    }

    /// Merge a partial bio reading. The status follows the load unless given
    /// explicitly; `last_updated` is always refreshed.
    pub fn update_bio_status(&mut self, patch: BioPatch) -> Result<BioDataPoint, StoreError> {
        let mut next = self.state.clone();
        let bio = &mut next.bio_status;
        if let Some(load) = patch.current_load {
            bio.current_load = load.min(100);
            bio.status = BioStatus::from_load(bio.current_load);
        }
        if let Some(status) = patch.status {
            bio.status = status;
        }
        bio.last_updated = Utc::now();

        let updated = *bio;
        self.commit(next, vec![StoreEvent::BioStatusChanged(updated)])?;
        Ok(updated)
    }

    /// Activate the nudge with `patch` merged over the previous payload.
    pub fn trigger_nudge(&mut self, patch: NudgePatch) -> Result<(), StoreError> {
        let mut next = self.state.clone();
        let mut machine = NudgeMachine::from_state(next.nudge);
        machine.trigger(patch);
        next.nudge = machine.into_state();

        let event = StoreEvent::NudgeChanged(next.nudge.clone());
        self.commit(next, vec![event])
    }

    /// Deactivate the nudge and, in the same write, reset the bio status to
    /// the optimal baseline.
    pub fn dismiss_nudge(&mut self) -> Result<(), StoreError> {
        let mut next = self.state.clone();
        let mut machine = NudgeMachine::from_state(next.nudge);
        machine.dismiss();
        next.nudge = machine.into_state();
        next.bio_status = BioDataPoint::baseline();

        let events = vec![
            StoreEvent::NudgeChanged(next.nudge.clone()),
            StoreEvent::BioStatusChanged(next.bio_status),
        ];
        self.commit(next, events)
    }

    fn commit(&mut self, next: SakinaStore, events: Vec<StoreEvent>) -> Result<(), StoreError> {
        let json = serde_json::to_string(&next)?;
        self.slot.write(&json)?;
        self.state = next;
        tracing::debug!(slot = self.slot.key(), bytes = json.len(), "store written");

        for event in events {
            self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
        Ok(())
    }
}

fn load_state(slot: &dyn StorageSlot) -> SakinaStore {
    match slot.read() {
        Ok(Some(content)) => match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(slot = slot.key(), "Corrupt store slot, using defaults: {e}");
                SakinaStore::default()
            }
        },
        Ok(None) => SakinaStore::default(),
        Err(e) => {
            tracing::warn!(slot = slot.key(), "Could not read store slot, using defaults: {e}");
            SakinaStore::default()
        }
    }
}

/// Store shared between a composition root and the tasks it spawns.
pub type SharedStore = Arc<Mutex<Store>>;

/// Open a store and wrap it for sharing.
pub fn create_shared_store(slot: impl StorageSlot + 'static) -> SharedStore {
    Arc::new(Mutex::new(Store::open(slot)))
}
