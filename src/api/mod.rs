//! Remote AI backend access.
//!
//! This module contains:
//! - Wire types for journal analysis, nudges, insights and the user profile
//! - An authenticated HTTP client with a per-request timeout
//! - A keyed query cache with per-resource staleness and polling
//! - The data access layer combining both, with retries and invalidation

pub mod access;
pub mod cache;
pub mod client;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use access::{BackendStatus, DataAccess, ProfileStatus};
pub use cache::{CachePolicy, QueryCache, QueryKey, Resource};
pub use client::{ApiClient, BlockingApiClient, EnvToken, StaticToken, TokenProvider};
pub use error::ApiError;
pub use types::{
    CreateJournalEntry, DashboardSummary, InsightsStats, InterventionLogRequest, JournalAnalysis,
    JournalEntryResponse, JournalQuery, JournalingStreak, NudgeDecision, ProfileUpdate,
    StressPattern, UserProfile,
};
