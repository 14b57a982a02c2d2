//! HTTP client for the AI backend.
//!
//! Every authenticated call resolves a bearer token first; without one the
//! call fails with [`ApiError::Unauthenticated`] and nothing is sent. Each
//! request is bounded by the configured timeout, reported as
//! [`ApiError::Timeout`] rather than a network error.

use crate::api::error::ApiError;
use crate::api::types::{
    AnalyzeRequest, CreateJournalEntry, DashboardSummary, InsightsRequest, InsightsStats,
    InterventionLogRequest, JournalAnalysis, JournalEntryResponse, JournalQuery,
    JournalingStreak, NudgeDecision, NudgeStatus, ProfileUpdate, RecentInterventions,
    StressPattern, UserProfile,
};
use crate::config::Config;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable read by [`EnvToken`].
pub const ACCESS_TOKEN_ENV: &str = "SAKINA_ACCESS_TOKEN";

/// Source of the bearer credential, normally the auth provider's session.
pub trait TokenProvider: Send + Sync {
    /// Current access token, `None` when signed out.
    fn access_token(&self) -> Option<String>;
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn access_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Token read from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(ACCESS_TOKEN_ENV)
    }
}

impl TokenProvider for EnvToken {
    fn access_token(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// Async backend client. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
    token: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`).
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        token: Arc<dyn TokenProvider>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Setup(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            http,
            token,
        })
    }

    /// Create a client from the application configuration.
    pub fn from_config(config: &Config, token: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        Self::new(config.api_base_url.clone(), config.request_timeout, token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self
            .token
            .access_token()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                tracing::warn!("No auth token found");
                ApiError::Unauthenticated
            })?;

        Ok(self.http.request(method, self.url(path)).bearer_auth(token))
    }

    /// Bound a whole exchange, body included, by the client timeout.
    async fn bounded<T>(
        &self,
        exchange: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        tokio::time::timeout(self.timeout, exchange)
            .await
            .unwrap_or(Err(ApiError::Timeout))
    }

    async fn exchange(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        tracing::warn!(status = status.as_u16(), url = %response.url(), "Backend error");
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status.as_u16(), &body))
    }

    async fn send(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.bounded(async { self.exchange(request).await.map(|_| ()) })
            .await
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.bounded(async {
            self.exchange(request)
                .await?
                .json()
                .await
                .map_err(|e| ApiError::Serialization(e.to_string()))
        })
        .await
    }

    // Journal

    pub async fn create_journal_entry(
        &self,
        entry: &CreateJournalEntry,
    ) -> Result<JournalEntryResponse, ApiError> {
        let request = self.authorized(Method::POST, "/api/journal/")?.json(entry);
        self.json(request).await
    }

    pub async fn journal_entries(
        &self,
        query: &JournalQuery,
    ) -> Result<Vec<JournalEntryResponse>, ApiError> {
        let mut params = vec![
            ("skip", query.skip.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(mood) = query.mood {
            params.push(("mood", mood.to_string()));
        }
        let request = self.authorized(Method::GET, "/api/journal/")?.query(&params);
        self.json(request).await
    }

    pub async fn journal_entry(&self, id: &str) -> Result<JournalEntryResponse, ApiError> {
        let request = self.authorized(Method::GET, &format!("/api/journal/{id}"))?;
        self.json(request).await
    }

    pub async fn delete_journal_entry(&self, id: &str) -> Result<(), ApiError> {
        let request = self.authorized(Method::DELETE, &format!("/api/journal/{id}"))?;
        self.send(request).await
    }

    /// Analyze text without storing an entry.
    pub async fn analyze(&self, body: &AnalyzeRequest) -> Result<JournalAnalysis, ApiError> {
        let request = self.authorized(Method::POST, "/api/journal/analyze")?.json(body);
        self.json(request).await
    }

    // Nudges

    pub async fn check_nudge(&self) -> Result<NudgeDecision, ApiError> {
        let request = self
            .authorized(Method::POST, "/api/nudge/check")?
            .json(&serde_json::json!({}));
        self.json(request).await
    }

    pub async fn nudge_status(&self) -> Result<NudgeStatus, ApiError> {
        let request = self.authorized(Method::GET, "/api/nudge/status")?;
        self.json(request).await
    }

    // Insights

    pub async fn weekly_insights(&self, days: u32) -> Result<StressPattern, ApiError> {
        let request = self
            .authorized(Method::POST, "/api/insights/weekly")?
            .json(&InsightsRequest { days });
        self.json(request).await
    }

    pub async fn insights_stats(&self, days: u32) -> Result<InsightsStats, ApiError> {
        let request = self
            .authorized(Method::GET, "/api/insights/stats")?
            .query(&[("days", days)]);
        self.json(request).await
    }

    pub async fn journaling_streak(&self) -> Result<JournalingStreak, ApiError> {
        let request = self.authorized(Method::GET, "/api/insights/streak")?;
        self.json(request).await
    }

    // Interventions

    pub async fn log_intervention(&self, log: &InterventionLogRequest) -> Result<(), ApiError> {
        let request = self.authorized(Method::POST, "/api/intervention/")?.json(log);
        self.send(request).await
    }

    pub async fn recent_interventions(&self, hours: u32) -> Result<RecentInterventions, ApiError> {
        let request = self
            .authorized(Method::GET, "/api/intervention/recent")?
            .query(&[("hours", hours)]);
        self.json(request).await
    }

    // User

    pub async fn user_profile(&self) -> Result<UserProfile, ApiError> {
        let request = self.authorized(Method::GET, "/api/user/profile")?;
        self.json(request).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let request = self.authorized(Method::PUT, "/api/user/profile")?.json(update);
        self.send(request).await
    }

    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        let request = self.authorized(Method::GET, "/api/dashboard/summary")?;
        self.json(request).await
    }

    /// Probe the unauthenticated health endpoint.
    pub async fn health(&self) -> Result<bool, ApiError> {
        let request = self.http.get(self.url("/health"));
        match tokio::time::timeout(self.timeout, request.send()).await {
            Err(_) => Err(ApiError::Timeout),
            Ok(Err(e)) => Err(ApiError::Network(e.to_string())),
            Ok(Ok(response)) => Ok(response.status().is_success()),
        }
    }
}

/// Blocking client for synchronous contexts such as the CLI.
pub struct BlockingApiClient {
    inner: ApiClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingApiClient {
    pub fn new(inner: ApiClient) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::Setup(format!("Failed to create runtime: {e}")))?;

        Ok(Self { inner, runtime })
    }

    pub fn from_config(config: &Config, token: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        Self::new(ApiClient::from_config(config, token)?)
    }

    pub fn inner(&self) -> &ApiClient {
        &self.inner
    }

    pub fn create_journal_entry(
        &self,
        entry: &CreateJournalEntry,
    ) -> Result<JournalEntryResponse, ApiError> {
        self.runtime.block_on(self.inner.create_journal_entry(entry))
    }

    pub fn journal_entries(
        &self,
        query: &JournalQuery,
    ) -> Result<Vec<JournalEntryResponse>, ApiError> {
        self.runtime.block_on(self.inner.journal_entries(query))
    }

    pub fn check_nudge(&self) -> Result<NudgeDecision, ApiError> {
        self.runtime.block_on(self.inner.check_nudge())
    }

    pub fn weekly_insights(&self, days: u32) -> Result<StressPattern, ApiError> {
        self.runtime.block_on(self.inner.weekly_insights(days))
    }

    pub fn log_intervention(&self, log: &InterventionLogRequest) -> Result<(), ApiError> {
        self.runtime.block_on(self.inner.log_intervention(log))
    }

    pub fn user_profile(&self) -> Result<UserProfile, ApiError> {
        self.runtime.block_on(self.inner.user_profile())
    }

    pub fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        self.runtime.block_on(self.inner.dashboard_summary())
    }

    pub fn health(&self) -> Result<bool, ApiError> {
        self.runtime.block_on(self.inner.health())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoToken;

    impl TokenProvider for NoToken {
        fn access_token(&self) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new(
            "http://localhost:8000/",
            Duration::from_secs(15),
            Arc::new(StaticToken::new("t")),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/health"), "http://localhost:8000/health");
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_sending() {
        // Nothing listens on this port; reaching the network would yield Network
        let client = ApiClient::new(
            "http://127.0.0.1:9",
            Duration::from_secs(15),
            Arc::new(NoToken),
        )
        .unwrap();
        assert_eq!(client.check_nudge().await, Err(ApiError::Unauthenticated));

        let blank = ApiClient::new(
            "http://127.0.0.1:9",
            Duration::from_secs(15),
            Arc::new(StaticToken::new("  ")),
        )
        .unwrap();
        assert_eq!(blank.journaling_streak().await, Err(ApiError::Unauthenticated));
    }
}
