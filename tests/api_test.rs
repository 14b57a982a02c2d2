//! Integration tests for backend data access against a local fake backend

#[cfg(feature = "api")]
mod api_tests {
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use sakina_companion::api::{
        ApiClient, ApiError, BackendStatus, CreateJournalEntry, DataAccess, JournalQuery,
        ProfileStatus, QueryKey, StaticToken,
    };
    use sakina_companion::routing::{guard, ProfileState, Route, RouteDecision};
    use sakina_companion::store::types::{EntryKind, Mood};
    use serde_json::json;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;
    use tokio::time::Instant;

    const TOKEN: &str = "test-token";

    #[derive(Default)]
    struct Counters {
        journal_reads: AtomicUsize,
        profile_reads: AtomicUsize,
        stats_reads: AtomicUsize,
        dashboard_reads: AtomicUsize,
    }

    type Shared = Arc<Counters>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == format!("Bearer {TOKEN}"))
            .unwrap_or(false)
    }

    fn entry_json(id: &str, analyzed: bool) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": "u1",
            "entry_type": "text",
            "content": "Feeling overwhelmed",
            "mood": "stressed",
            "stress_score": if analyzed { json!(72) } else { json!(null) },
            "analyzed_at": if analyzed { json!("2024-03-01T10:00:05") } else { json!(null) },
            "created_at": "2024-03-01T10:00:00"
        })
    }

    async fn list_entries(
        State(counters): State<Shared>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        if !authorized(&headers) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Invalid token"})),
            );
        }
        counters.journal_reads.fetch_add(1, Ordering::SeqCst);
        // Only the unfiltered listing has an entry still waiting for analysis
        let entries = match params.get("mood").map(String::as_str) {
            Some("calm") => json!([entry_json("e4", true), entry_json("e1", true)]),
            _ => json!([entry_json("e2", false), entry_json("e1", true)]),
        };
        (StatusCode::OK, Json(entries))
    }

    async fn create_entry(
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> impl IntoResponse {
        if !authorized(&headers) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Invalid token"})),
            );
        }
        let mut created = entry_json("e3", false);
        created["content"] = body["content"].clone();
        (StatusCode::CREATED, Json(created))
    }

    async fn profile(State(counters): State<Shared>) -> impl IntoResponse {
        counters.profile_reads.fetch_add(1, Ordering::SeqCst);
        (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "User profile not found"})),
        )
    }

    async fn stats(State(counters): State<Shared>) -> impl IntoResponse {
        // Fails twice, then recovers
        let call = counters.stats_reads.fetch_add(1, Ordering::SeqCst);
        if call < 2 {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Database unavailable"})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "period_days": 7,
                "entry_count": 4,
                "avg_stress_score": 48.5,
                "mood_distribution": {"stressed": 2, "calm": 2},
                "intervention_count": 3,
                "completed_interventions": 2,
                "total_calm_minutes": 6.5
            })),
        )
    }

    async fn dashboard(State(counters): State<Shared>) -> impl IntoResponse {
        counters.dashboard_reads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(500)).await;
        StatusCode::OK
    }

    async fn health() -> impl IntoResponse {
        Json(json!({"status": "ok"}))
    }

    async fn start_backend() -> (SocketAddr, Shared, oneshot::Sender<()>) {
        let counters: Shared = Arc::new(Counters::default());
        let app = Router::new()
            .route("/api/journal/", get(list_entries).post(create_entry))
            .route("/api/user/profile", get(profile))
            .route("/api/insights/stats", get(stats))
            .route("/api/dashboard/summary", get(dashboard))
            .route("/health", get(health))
            .with_state(counters.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        (addr, counters, shutdown_tx)
    }

    fn access(addr: SocketAddr, token: &str, timeout: Duration) -> DataAccess {
        let client = ApiClient::new(
            format!("http://{addr}/"),
            timeout,
            Arc::new(StaticToken::new(token)),
        )
        .expect("Failed to create client");
        DataAccess::new(client).with_retry_base(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_journal_reads_are_cached_until_invalidated() {
        let (addr, counters, shutdown) = start_backend().await;
        let mut data = access(addr, TOKEN, Duration::from_secs(5));

        let entries = data.journal_entries(JournalQuery::default()).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].is_analyzed());
        assert_eq!(entries[1].stress_score, Some(72));

        data.journal_entries(JournalQuery::default()).await.unwrap();
        assert_eq!(counters.journal_reads.load(Ordering::SeqCst), 1);

        let created = data
            .create_journal_entry(&CreateJournalEntry {
                content: "A new thought".to_string(),
                mood: Mood::Okay,
                entry_type: EntryKind::Text,
            })
            .await
            .unwrap();
        assert_eq!(created.content, "A new thought");

        let key = QueryKey::JournalEntries {
            mood: None,
            skip: 0,
            limit: 20,
        };
        assert_eq!(data.refetch_due(), vec![key]);

        assert_eq!(data.refresh_due().await, 1);
        assert_eq!(counters.journal_reads.load(Ordering::SeqCst), 2);
        assert!(data.refetch_due().is_empty());

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_unanalyzed_entries_keep_polling() {
        let (addr, _counters, shutdown) = start_backend().await;
        let mut data = access(addr, TOKEN, Duration::from_secs(5));

        data.journal_entries(JournalQuery::default()).await.unwrap();
        let later = Instant::now() + Duration::from_secs(11);
        let due = data.cache().refetch_due(later);
        assert!(due.contains(&QueryKey::JournalEntries {
            mood: None,
            skip: 0,
            limit: 20,
        }));

        let _ = shutdown.send(());
    }

    fn calm_key() -> QueryKey {
        QueryKey::JournalEntries {
            mood: Some(Mood::Calm),
            skip: 0,
            limit: 20,
        }
    }

    fn calm_query() -> JournalQuery {
        JournalQuery {
            mood: Some(Mood::Calm),
            ..JournalQuery::default()
        }
    }

    #[tokio::test]
    async fn test_analyzed_entries_do_not_poll() {
        let (addr, _counters, shutdown) = start_backend().await;
        let mut data = access(addr, TOKEN, Duration::from_secs(5));

        let entries = data.journal_entries(calm_query()).await.unwrap();
        assert!(entries.iter().all(|e| e.is_analyzed()));

        let later = Instant::now() + Duration::from_secs(11);
        assert!(data.cache().refetch_due(later).is_empty());

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_refresh_leaves_other_lists_alone() {
        let (addr, counters, shutdown) = start_backend().await;
        let mut data = access(addr, TOKEN, Duration::from_secs(5));
        let pending = QueryKey::JournalEntries {
            mood: None,
            skip: 0,
            limit: 20,
        };

        data.journal_entries(JournalQuery::default()).await.unwrap();
        data.journal_entries(calm_query()).await.unwrap();
        assert_eq!(counters.journal_reads.load(Ordering::SeqCst), 2);

        data.refresh(pending).await.unwrap();
        assert_eq!(counters.journal_reads.load(Ordering::SeqCst), 3);
        assert!(data.refetch_due().is_empty());
        assert!(data.cache().is_fresh(&calm_key(), Instant::now()));

        // Later polls only ever touch the pending list
        let later = Instant::now() + Duration::from_secs(11);
        assert_eq!(data.cache().refetch_due(later), vec![pending]);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_wrong_token_is_rejected() {
        let (addr, counters, shutdown) = start_backend().await;
        let mut data = access(addr, "stale-token", Duration::from_secs(5));

        let err = data
            .journal_entries(JournalQuery::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Server {
                status: 401,
                message: "Invalid token".to_string()
            }
        );
        assert_eq!(counters.journal_reads.load(Ordering::SeqCst), 0);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_missing_profile_routes_to_onboarding() {
        let (addr, counters, shutdown) = start_backend().await;
        let mut data = access(addr, TOKEN, Duration::from_secs(5));

        let result = data.user_profile().await;
        assert!(matches!(result, Ok(ProfileStatus::Missing)));
        assert_eq!(counters.profile_reads.load(Ordering::SeqCst), 1);

        let state = ProfileState::from(&result);
        assert_eq!(
            guard(Route::Journal, true, &state),
            RouteDecision::Redirect(Route::Onboarding)
        );

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let (addr, counters, shutdown) = start_backend().await;
        let mut data = access(addr, TOKEN, Duration::from_secs(5));

        let stats = data.insights_stats(7).await.unwrap();
        assert_eq!(stats.entry_count, 4);
        assert_eq!(stats.mood_distribution.get("calm"), Some(&2));
        assert_eq!(counters.stats_reads.load(Ordering::SeqCst), 3);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let (addr, counters, shutdown) = start_backend().await;
        let mut data = access(addr, TOKEN, Duration::from_millis(100));

        let err = data.dashboard_summary().await.unwrap_err();
        assert_eq!(err, ApiError::Timeout);
        assert_eq!(err.user_message(), "Request timed out");
        // One retry for the dashboard
        assert_eq!(counters.dashboard_reads.load(Ordering::SeqCst), 2);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        // Sends headers and the start of a body, then stops writing
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0_u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 512\r\n\r\n{\"current_streak\":",
                )
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = ApiClient::new(
            format!("http://{addr}"),
            Duration::from_millis(200),
            Arc::new(StaticToken::new(TOKEN)),
        )
        .unwrap();
        assert_eq!(client.journaling_streak().await, Err(ApiError::Timeout));

        server.abort();
    }

    #[tokio::test]
    async fn test_backend_status() {
        let (addr, _counters, shutdown) = start_backend().await;
        let mut data = access(addr, TOKEN, Duration::from_secs(5));
        assert_eq!(data.backend_status().await, BackendStatus::Available);
        let _ = shutdown.send(());

        let mut offline = access(
            "127.0.0.1:9".parse().unwrap(),
            TOKEN,
            Duration::from_millis(500),
        );
        assert_eq!(offline.backend_status().await, BackendStatus::Unavailable);
    }
}
