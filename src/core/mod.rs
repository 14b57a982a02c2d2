//! Core computation for the companion.
//!
//! This module contains:
//! - The mock bio-load series generator
//! - Statistical summaries of a series
//! - The static intervention catalog and mood table

pub mod bio;
pub mod catalog;
pub mod trends;

// Re-export commonly used types
pub use bio::{
    generate, generate_bio_trends, trend_window, BioTrendConfig, BioTrendPoint,
    TrendIntervention, TrendWindowError, MAX_TREND_DAYS,
};
pub use catalog::{
    find_intervention, mood_style, preparation_text, BreathParams, InterventionDef, MoodStyle,
    INTERVENTIONS,
};
pub use trends::{extract_interventions, TrendSummary};
