//! Local companion state.
//!
//! This module contains:
//! - The data model persisted in the local slot
//! - Slot implementations (file-backed and in-memory)
//! - The nudge lifecycle
//! - The store and its named actions

pub mod nudge;
pub mod slot;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use nudge::{NudgeMachine, NudgePhase};
pub use slot::{FileSlot, MemorySlot, StorageSlot, StoreError};
pub use state::{create_shared_store, SharedStore, Store, StoreEvent};
pub use types::{
    BioDataPoint, BioPatch, BioStatus, EntryKind, InterventionKind, InterventionLog,
    JournalEntry, Language, Mood, NewInterventionLog, NewJournalEntry, NotificationPatch,
    NotificationPreferences, NudgeKind, NudgePatch, NudgeState, ParseVariantError, SakinaStore,
    SubscriptionTier, Theme, UserPreferences, BASELINE_LOAD,
};
