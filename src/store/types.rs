//! Data model for the persisted companion state.
//!
//! Everything here serializes with camelCase field names so a slot written by
//! one build can be read back by the next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Implements `as_str`, `Display` and `FromStr` for a plain string enum.
macro_rules! string_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseVariantError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseVariantError {
                        kind: $label,
                        value: s.to_string(),
                        expected: concat!($($text, " "),+),
                    }),
                }
            }
        }
    };
}

/// Color theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the operating system color scheme
    System,
}

string_enum!(Theme, "theme", { Light => "light", Dark => "dark", System => "system" });

/// Interface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

string_enum!(Language, "language", { En => "en", Ar => "ar" });

impl Language {
    /// Whether text in this language runs right-to-left.
    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Ar)
    }
}

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
}

string_enum!(SubscriptionTier, "subscription tier", { Free => "free", Premium => "premium" });

/// Self-reported mood attached to a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Stressed,
    Anxious,
    Tired,
    Okay,
    Calm,
    Energized,
}

string_enum!(Mood, "mood", {
    Stressed => "stressed",
    Anxious => "anxious",
    Tired => "tired",
    Okay => "okay",
    Calm => "calm",
    Energized => "energized",
});

/// Notification toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub nudges: bool,
    pub daily_reminder: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            nudges: true,
            daily_reminder: false,
        }
    }
}

/// Partial update for [`NotificationPreferences`]; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationPatch {
    pub nudges: Option<bool>,
    pub daily_reminder: Option<bool>,
}

/// User preferences. Overwritten, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub theme: Theme,
    pub language: Language,
    pub notifications: NotificationPreferences,
    #[serde(default)]
    pub subscription: SubscriptionTier,
}

/// How a journal entry was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Text,
    Voice,
}

string_enum!(EntryKind, "entry kind", { Text => "text", Voice => "voice" });

/// A journal entry. Immutable once created except for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Entry text, or the recording length (e.g. `"42s"`) for voice entries
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    pub timestamp: DateTime<Utc>,
}

/// Caller-supplied part of a journal entry; id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalEntry {
    pub kind: EntryKind,
    pub content: String,
    pub mood: Option<Mood>,
}

impl NewJournalEntry {
    /// A typed entry. Surrounding whitespace is trimmed.
    pub fn text(content: impl AsRef<str>, mood: Option<Mood>) -> Self {
        Self {
            kind: EntryKind::Text,
            content: content.as_ref().trim().to_string(),
            mood,
        }
    }

    /// A voice entry; the recording length stands in for the content.
    pub fn voice(duration_secs: u32, mood: Option<Mood>) -> Self {
        Self {
            kind: EntryKind::Voice,
            content: format!("{duration_secs}s"),
            mood,
        }
    }
}

/// Category of a micro-intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionKind {
    Breathing,
    Grounding,
    Pause,
}

string_enum!(InterventionKind, "intervention kind", {
    Breathing => "breathing",
    Grounding => "grounding",
    Pause => "pause",
});

/// Record of a finished intervention session. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionLog {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InterventionKind,
    /// Catalog id of the exercise, e.g. `box-breathing`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: u32,
    pub completed: bool,
}

/// Caller-supplied part of an intervention log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInterventionLog {
    pub kind: InterventionKind,
    pub sub_type: Option<String>,
    pub duration_seconds: u32,
    pub completed: bool,
}

/// Categorical bio-load status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BioStatus {
    Low,
    Optimal,
    High,
    Overload,
}

string_enum!(BioStatus, "bio status", {
    Low => "low",
    Optimal => "optimal",
    High => "high",
    Overload => "overload",
});

/// Upper bound (exclusive) of the `low` band.
pub const LOW_LOAD_BELOW: u8 = 30;
/// Lower bound (inclusive) of the `high` band.
pub const HIGH_LOAD_FROM: u8 = 60;
/// Lower bound (inclusive) of the `overload` band.
pub const OVERLOAD_LOAD_FROM: u8 = 80;

impl BioStatus {
    /// Derive the status band for a load value.
    pub fn from_load(load: u8) -> Self {
        if load < LOW_LOAD_BELOW {
            BioStatus::Low
        } else if load < HIGH_LOAD_FROM {
            BioStatus::Optimal
        } else if load < OVERLOAD_LOAD_FROM {
            BioStatus::High
        } else {
            BioStatus::Overload
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            BioStatus::Low => "Low Activity",
            BioStatus::Optimal => "Optimal",
            BioStatus::High => "Elevated",
            BioStatus::Overload => "Stressed",
        }
    }
}

/// Load the bio status returns to whenever a nudge is dismissed.
pub const BASELINE_LOAD: u8 = 35;

/// The single live bio-load reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BioDataPoint {
    /// Load in 0..=100
    pub current_load: u8,
    pub status: BioStatus,
    pub last_updated: DateTime<Utc>,
}

impl BioDataPoint {
    /// The fixed optimal baseline, stamped now.
    pub fn baseline() -> Self {
        Self {
            current_load: BASELINE_LOAD,
            status: BioStatus::Optimal,
            last_updated: Utc::now(),
        }
    }
}

/// Partial bio status update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BioPatch {
    /// New load; values above 100 are clamped
    pub current_load: Option<u8>,
    /// Explicit status; derived from the load when absent
    pub status: Option<BioStatus>,
}

/// Category of a proactive nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NudgeKind {
    #[default]
    Breathing,
    Grounding,
    Reflection,
}

string_enum!(NudgeKind, "nudge kind", {
    Breathing => "breathing",
    Grounding => "grounding",
    Reflection => "reflection",
});

impl NudgeKind {
    /// Catalog exercise a nudge of this kind leads into. Reflection nudges
    /// point at the journal instead.
    pub fn suggested_intervention(&self) -> Option<&'static str> {
        match self {
            NudgeKind::Breathing => Some("box-breathing"),
            NudgeKind::Grounding => Some("5-4-3-2-1-grounding"),
            NudgeKind::Reflection => None,
        }
    }
}

/// Proactive nudge payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NudgeState {
    pub active: bool,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NudgeKind,
    /// Why the nudge fired, e.g. "You've been typing fast"
    pub context: String,
}

/// Partial nudge payload; `None` keeps the previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NudgePatch {
    pub message: Option<String>,
    pub kind: Option<NudgeKind>,
    pub context: Option<String>,
}

impl NudgePatch {
    pub fn new(message: impl Into<String>, kind: NudgeKind) -> Self {
        Self {
            message: Some(message.into()),
            kind: Some(kind),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Aggregate root of everything persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SakinaStore {
    pub preferences: UserPreferences,
    pub journal_history: Vec<JournalEntry>,
    #[serde(default)]
    pub intervention_history: Vec<InterventionLog>,
    pub bio_status: BioDataPoint,
    pub nudge: NudgeState,
}

impl Default for SakinaStore {
    fn default() -> Self {
        Self {
            preferences: UserPreferences::default(),
            journal_history: Vec::new(),
            intervention_history: Vec::new(),
            bio_status: BioDataPoint::baseline(),
            nudge: NudgeState::default(),
        }
    }
}
