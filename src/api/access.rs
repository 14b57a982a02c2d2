//! Cached, retrying access to the backend.
//!
//! Reads are served from the [`QueryCache`] while fresh; otherwise they are
//! fetched, retrying retryable failures with exponential backoff. Mutations
//! invalidate the reads that depend on them once they succeed. State only
//! changes after the backend confirms.

use crate::api::cache::{QueryCache, QueryKey, Resource};
use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::api::types::{
    AnalyzeRequest, CreateJournalEntry, DashboardSummary, InsightsStats, InterventionLogRequest,
    JournalAnalysis, JournalEntryResponse, JournalQuery, JournalingStreak, NudgeDecision,
    NudgeStatus, ProfileUpdate, RecentInterventions, StressPattern, UserProfile,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default first retry delay.
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(1);
/// Upper bound for any retry delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Outcome of a profile fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStatus {
    Found(UserProfile),
    /// The user has not onboarded yet
    Missing,
}

/// Result of the health probe, driving the "backend unavailable" banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Available,
    Unavailable,
}

#[derive(Debug)]
pub struct DataAccess {
    client: ApiClient,
    cache: QueryCache,
    retry_base: Duration,
}

impl DataAccess {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            cache: QueryCache::new(),
            retry_base: DEFAULT_RETRY_BASE,
        }
    }

    /// Set the first retry delay; later retries double it.
    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.retry_base
            .checked_mul(factor)
            .unwrap_or(MAX_RETRY_DELAY)
            .min(MAX_RETRY_DELAY)
    }

    async fn with_retry<T, F, Fut>(&self, retries: u32, fetch: F) -> Result<T, ApiError>
    where
        F: Fn(ApiClient) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0;
        loop {
            match fetch(self.client.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < retries => {
                    let delay = self.retry_delay(attempt);
                    tracing::warn!("Request failed ({e}), retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn read<T, F, Fut>(&mut self, key: QueryKey, fetch: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(ApiClient) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(value) = self.cache.get_fresh::<T>(&key, Instant::now()) {
            tracing::debug!(?key, "cache hit");
            return Ok(value);
        }

        tracing::debug!(?key, "cache miss");
        let value = self.with_retry(key.policy().retry, fetch).await?;
        self.cache.insert(key, value.clone(), Instant::now());
        Ok(value)
    }

    fn invalidate(&mut self, resources: &[Resource]) {
        for resource in resources {
            let count = self.cache.invalidate(*resource);
            tracing::debug!(?resource, count, "invalidated");
        }
    }

    // Reads

    /// Journal entries. The cached list keeps polling while any entry is
    /// still waiting for its analysis.
    pub async fn journal_entries(
        &mut self,
        query: JournalQuery,
    ) -> Result<Vec<JournalEntryResponse>, ApiError> {
        let key = QueryKey::JournalEntries {
            mood: query.mood,
            skip: query.skip,
            limit: query.limit,
        };
        let entries: Vec<JournalEntryResponse> = self
            .read(key, move |client| async move { client.journal_entries(&query).await })
            .await?;

        let pending = entries.iter().any(|e| !e.is_analyzed());
        self.cache.set_polling(&key, pending);
        Ok(entries)
    }

    pub async fn nudge_check(&mut self) -> Result<NudgeDecision, ApiError> {
        self.read(QueryKey::NudgeCheck, |client| async move {
            client.check_nudge().await
        })
        .await
    }

    pub async fn weekly_insights(&mut self, days: u32) -> Result<StressPattern, ApiError> {
        self.read(QueryKey::WeeklyInsights { days }, move |client| async move {
            client.weekly_insights(days).await
        })
        .await
    }

    pub async fn insights_stats(&mut self, days: u32) -> Result<InsightsStats, ApiError> {
        self.read(QueryKey::InsightsStats { days }, move |client| async move {
            client.insights_stats(days).await
        })
        .await
    }

    pub async fn journaling_streak(&mut self) -> Result<JournalingStreak, ApiError> {
        self.read(QueryKey::JournalingStreak, |client| async move {
            client.journaling_streak().await
        })
        .await
    }

    pub async fn dashboard_summary(&mut self) -> Result<DashboardSummary, ApiError> {
        self.read(QueryKey::Dashboard, |client| async move {
            client.dashboard_summary().await
        })
        .await
    }

    /// The user's profile. A 404 means onboarding has not happened yet and is
    /// reported as [`ProfileStatus::Missing`], never retried.
    pub async fn user_profile(&mut self) -> Result<ProfileStatus, ApiError> {
        let result = self
            .read(QueryKey::UserProfile, |client| async move {
                client.user_profile().await
            })
            .await;

        match result {
            Ok(profile) => Ok(ProfileStatus::Found(profile)),
            Err(ApiError::NotFound(_)) => {
                tracing::debug!("No profile yet");
                Ok(ProfileStatus::Missing)
            }
            Err(e) => Err(e),
        }
    }

    /// Probe the backend; failures of any kind mean unavailable.
    pub async fn backend_status(&mut self) -> BackendStatus {
        let healthy = self
            .read(QueryKey::Health, |client| async move { client.health().await })
            .await
            .unwrap_or(false);

        if healthy {
            BackendStatus::Available
        } else {
            BackendStatus::Unavailable
        }
    }

    // Uncached pass-through reads

    pub async fn nudge_status(&self) -> Result<NudgeStatus, ApiError> {
        self.client.nudge_status().await
    }

    pub async fn recent_interventions(&self, hours: u32) -> Result<RecentInterventions, ApiError> {
        self.client.recent_interventions(hours).await
    }

    pub async fn journal_entry(&self, id: &str) -> Result<JournalEntryResponse, ApiError> {
        self.client.journal_entry(id).await
    }

    pub async fn analyze(&self, body: &AnalyzeRequest) -> Result<JournalAnalysis, ApiError> {
        self.client.analyze(body).await
    }

    // Mutations

    pub async fn create_journal_entry(
        &mut self,
        entry: &CreateJournalEntry,
    ) -> Result<JournalEntryResponse, ApiError> {
        let created = self.client.create_journal_entry(entry).await?;
        tracing::info!(id = %created.id, "Journal entry saved");
        self.invalidate(&[Resource::JournalEntries, Resource::Dashboard]);
        Ok(created)
    }

    pub async fn delete_journal_entry(&mut self, id: &str) -> Result<(), ApiError> {
        self.client.delete_journal_entry(id).await?;
        tracing::info!(id, "Journal entry deleted");
        self.invalidate(&[Resource::JournalEntries, Resource::Dashboard]);
        Ok(())
    }

    pub async fn log_intervention(&mut self, log: &InterventionLogRequest) -> Result<(), ApiError> {
        self.client.log_intervention(log).await?;
        tracing::info!(kind = %log.intervention_type, "Intervention logged");
        self.invalidate(&[
            Resource::InsightsStats,
            Resource::NudgeCheck,
            Resource::Dashboard,
        ]);
        Ok(())
    }

    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.client.update_profile(update).await?;
        tracing::info!("Profile updated");
        self.invalidate(&[Resource::UserProfile]);
        Ok(())
    }

    // Background refresh

    /// Cached keys that should be refetched now.
    pub fn refetch_due(&self) -> Vec<QueryKey> {
        self.cache.refetch_due(Instant::now())
    }

    /// Refetch one key regardless of freshness.
    pub async fn refresh(&mut self, key: QueryKey) -> Result<(), ApiError> {
        self.cache.invalidate_key(&key);
        match key {
            QueryKey::JournalEntries { mood, skip, limit } => {
                self.journal_entries(JournalQuery { skip, limit, mood })
                    .await
                    .map(|_| ())
            }
            QueryKey::NudgeCheck => self.nudge_check().await.map(|_| ()),
            QueryKey::WeeklyInsights { days } => self.weekly_insights(days).await.map(|_| ()),
            QueryKey::InsightsStats { days } => self.insights_stats(days).await.map(|_| ()),
            QueryKey::JournalingStreak => self.journaling_streak().await.map(|_| ()),
            QueryKey::UserProfile => self.user_profile().await.map(|_| ()),
            QueryKey::Health => {
                self.backend_status().await;
                Ok(())
            }
            QueryKey::Dashboard => self.dashboard_summary().await.map(|_| ()),
        }
    }

    /// Refetch everything that is due. Failures are logged and leave the
    /// previous value in place.
    pub async fn refresh_due(&mut self) -> usize {
        let due = self.refetch_due();
        let mut refreshed = 0;
        for key in due {
            match self.refresh(key).await {
                Ok(()) => refreshed += 1,
                Err(e) => tracing::warn!(?key, "Background refetch failed: {e}"),
            }
        }
        refreshed
    }
}
