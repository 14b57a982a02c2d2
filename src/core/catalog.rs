//! Static reference data: the intervention catalog and mood presentation.

use crate::store::types::{InterventionKind, Mood};
use serde::Serialize;

/// Phase timings of a breathing pattern, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreathParams {
    pub inhale: u32,
    pub hold_in: u32,
    pub exhale: u32,
    pub hold_out: u32,
}

impl BreathParams {
    /// Length of one full cycle (skipped holds count as zero).
    pub fn cycle_seconds(&self) -> u32 {
        self.inhale + self.hold_in + self.exhale + self.hold_out
    }

    /// Breaths per minute at this pace.
    pub fn breaths_per_minute(&self) -> f64 {
        match self.cycle_seconds() {
            0 => 0.0,
            secs => 60.0 / secs as f64,
        }
    }
}

/// A catalog exercise. Read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub duration_label: &'static str,
    #[serde(rename = "type")]
    pub kind: InterventionKind,
    /// Present for breathing exercises only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<BreathParams>,
}

pub const INTERVENTIONS: &[InterventionDef] = &[
    InterventionDef {
        id: "box-breathing",
        title: "Box Breathing",
        description: "A powerful technique to regain control and calm the nervous system.",
        duration_label: "1 min",
        kind: InterventionKind::Breathing,
        params: Some(BreathParams {
            inhale: 4,
            hold_in: 4,
            exhale: 4,
            hold_out: 4,
        }),
    },
    InterventionDef {
        id: "4-7-8-breathing",
        title: "4-7-8 Relaxing Breath",
        description: "Natural tranquilizer for the nervous system to reduce anxiety.",
        duration_label: "2 min",
        kind: InterventionKind::Breathing,
        params: Some(BreathParams {
            inhale: 4,
            hold_in: 7,
            exhale: 8,
            hold_out: 0,
        }),
    },
    InterventionDef {
        id: "5-4-3-2-1-grounding",
        title: "5-4-3-2-1 Grounding",
        description: "Use your senses to bring yourself back to the present moment.",
        duration_label: "3-5 min",
        kind: InterventionKind::Grounding,
        params: None,
    },
    InterventionDef {
        id: "1-minute-pause",
        title: "1-Minute Pause",
        description: "A simple pause to reset and center yourself.",
        duration_label: "1 min",
        kind: InterventionKind::Pause,
        params: None,
    },
];

/// Look up a catalog entry by id.
pub fn find_intervention(id: &str) -> Option<&'static InterventionDef> {
    INTERVENTIONS.iter().find(|def| def.id == id)
}

/// Catalog entries of one kind.
pub fn interventions_of(kind: InterventionKind) -> impl Iterator<Item = &'static InterventionDef> {
    INTERVENTIONS.iter().filter(move |def| def.kind == kind)
}

/// Instructions shown during the pre-roll countdown.
pub fn preparation_text(kind: InterventionKind) -> &'static str {
    match kind {
        InterventionKind::Breathing => "Find a comfortable position and focus on your breath.",
        InterventionKind::Grounding => "Look around you and prepare to engage your senses.",
        InterventionKind::Pause => "Take a moment to pause and reset.",
    }
}

/// Display attributes for a mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodStyle {
    pub label: &'static str,
    pub emoji: &'static str,
}

pub fn mood_style(mood: Mood) -> MoodStyle {
    let (label, emoji) = match mood {
        Mood::Stressed => ("Stressed", "😫"),
        Mood::Anxious => ("Anxious", "😰"),
        Mood::Tired => ("Tired", "😴"),
        Mood::Okay => ("Okay", "😐"),
        Mood::Calm => ("Calm", "😌"),
        Mood::Energized => ("Energized", "⚡"),
    };
    MoodStyle { label, emoji }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let def = find_intervention("4-7-8-breathing").unwrap();
        assert_eq!(def.kind, InterventionKind::Breathing);
        assert_eq!(def.params.unwrap().hold_out, 0);
        assert!(find_intervention("nope").is_none());
    }

    #[test]
    fn test_breathing_entries_have_params() {
        for def in INTERVENTIONS {
            assert_eq!(def.params.is_some(), def.kind == InterventionKind::Breathing);
        }
        assert_eq!(interventions_of(InterventionKind::Breathing).count(), 2);
    }

    #[test]
    fn test_box_breathing_pace() {
        let params = find_intervention("box-breathing").unwrap().params.unwrap();
        assert_eq!(params.cycle_seconds(), 16);
        assert!((params.breaths_per_minute() - 3.75).abs() < 1e-9);
    }

    #[test]
    fn test_every_mood_has_style() {
        for mood in Mood::ALL {
            assert!(!mood_style(*mood).label.is_empty());
        }
    }
}
