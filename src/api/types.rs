//! Request and response bodies of the AI backend.
//!
//! Field names follow the backend's snake_case JSON. Timestamps are accepted
//! with or without an offset; naive values are read as UTC.

use crate::store::types::{
    EntryKind, InterventionKind, Mood, NewInterventionLog, NudgeKind, NudgePatch,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod flexible_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.serialize_some(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp '{raw}'"))
                }),
                None => Ok(None),
            }
        }
    }
}

/// AI analysis of a piece of journal text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalAnalysis {
    /// 0..=100
    pub stress_score: u8,
    pub emotional_tone: String,
    pub key_themes: Vec<String>,
    #[serde(default)]
    pub suggested_intervention: Option<String>,
    pub supportive_message: String,
}

/// A journal entry stored on the backend, with its analysis once available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntryResponse {
    pub id: String,
    pub user_id: String,
    pub entry_type: EntryKind,
    pub content: String,
    pub mood: Mood,
    #[serde(default)]
    pub stress_score: Option<u8>,
    #[serde(default)]
    pub emotional_tone: Option<String>,
    #[serde(default)]
    pub key_themes: Option<Vec<String>>,
    #[serde(default)]
    pub suggested_intervention: Option<String>,
    #[serde(default)]
    pub supportive_message: Option<String>,
    #[serde(default, with = "flexible_time::option")]
    pub analyzed_at: Option<DateTime<Utc>>,
    #[serde(with = "flexible_time")]
    pub created_at: DateTime<Utc>,
}

impl JournalEntryResponse {
    /// Whether the backend finished analyzing this entry.
    pub fn is_analyzed(&self) -> bool {
        self.analyzed_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateJournalEntry {
    pub content: String,
    pub mood: Mood,
    pub entry_type: EntryKind,
}

/// Paging and filtering for the journal listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JournalQuery {
    pub skip: u32,
    pub limit: u32,
    pub mood: Option<Mood>,
}

impl Default for JournalQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 20,
            mood: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzeRequest {
    pub content: String,
    pub mood: Mood,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NudgePriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Backend decision on whether to show a nudge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeDecision {
    pub should_nudge: bool,
    #[serde(default)]
    pub message: String,
    /// May name a kind this client does not know; see [`NudgeDecision::to_patch`]
    #[serde(default = "default_nudge_type")]
    pub nudge_type: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub priority: NudgePriority,
}

fn default_nudge_type() -> String {
    NudgeKind::Breathing.as_str().to_string()
}

impl NudgeDecision {
    /// The store payload for a positive decision. Unknown nudge types fall
    /// back to breathing.
    pub fn to_patch(&self) -> Option<NudgePatch> {
        if !self.should_nudge {
            return None;
        }
        let kind = self.nudge_type.parse().unwrap_or_default();
        Some(NudgePatch::new(self.message.clone(), kind).with_context(self.context.clone()))
    }
}

/// Nudge metrics over the last day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NudgeStatus {
    pub entries_last_24h: u32,
    pub avg_stress_score: Option<f64>,
    pub last_intervention: Option<String>,
    pub high_stress_entries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressTrend {
    Improving,
    Stable,
    Declining,
}

/// Weekly AI insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressPattern {
    pub trend: StressTrend,
    pub avg_stress_score: f64,
    pub frequent_themes: Vec<String>,
    pub recommendation: String,
    pub weekly_summary: String,
    pub entry_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsightsRequest {
    pub days: u32,
}

/// Quick statistics over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsStats {
    pub period_days: u32,
    pub entry_count: u32,
    pub avg_stress_score: Option<f64>,
    #[serde(default)]
    pub mood_distribution: BTreeMap<String, u32>,
    pub intervention_count: u32,
    pub completed_interventions: u32,
    pub total_calm_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalingStreak {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_entries: u32,
}

/// Body for logging an intervention on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterventionLogRequest {
    pub intervention_type: InterventionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_reason: Option<String>,
    pub duration_seconds: u32,
    pub completed: bool,
}

impl From<&NewInterventionLog> for InterventionLogRequest {
    fn from(log: &NewInterventionLog) -> Self {
        Self {
            intervention_type: log.kind,
            subtype: log.sub_type.clone(),
            trigger_reason: None,
            duration_seconds: log.duration_seconds,
            completed: log.completed,
        }
    }
}

/// Intervention totals over recent hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentInterventions {
    pub count: u32,
    pub completed: u32,
    pub total_seconds: u64,
    pub total_minutes: f64,
}

/// Onboarding answers. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wearable_connected: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub locale: String,
    pub theme: String,
    pub subscription: String,
    pub nudge_enabled: bool,
    pub daily_reminder: bool,
    #[serde(flatten)]
    pub onboarding: ProfileUpdate,
}

/// Everything the dashboard shows, in one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub entries: Vec<JournalEntryResponse>,
    pub nudge: NudgeDecision,
    pub stats: InsightsStats,
    pub streak: JournalingStreak,
}
