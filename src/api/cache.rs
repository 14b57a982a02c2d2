//! Keyed cache of backend reads.
//!
//! Each cached value is stamped with the time it was fetched. It is served
//! while younger than its resource's stale time; after that, or after an
//! invalidation, the next read goes to the backend again. Values are keyed by
//! resource identity, so responses arriving out of order cannot overwrite a
//! different resource.

use crate::store::types::Mood;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Logical backend resource. Invalidation works per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    JournalEntries,
    NudgeCheck,
    WeeklyInsights,
    InsightsStats,
    JournalingStreak,
    UserProfile,
    Health,
    Dashboard,
}

/// Freshness and retry rules for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long a fetched value is served without refetching
    pub stale_time: Duration,
    /// Background refetch period, if the resource polls
    pub refetch_interval: Option<Duration>,
    /// Extra attempts after a retryable failure
    pub retry: u32,
}

const MINUTE: u64 = 60;

impl Resource {
    pub fn policy(&self) -> CachePolicy {
        let (stale_secs, refetch_secs, retry) = match self {
            // Polls only while an entry is still waiting for analysis
            Resource::JournalEntries => (2 * MINUTE, Some(10), 2),
            Resource::NudgeCheck => (5 * MINUTE, Some(5 * MINUTE), 1),
            Resource::WeeklyInsights => (30 * MINUTE, None, 2),
            Resource::InsightsStats => (10 * MINUTE, None, 2),
            Resource::JournalingStreak => (30 * MINUTE, None, 0),
            Resource::UserProfile => (5 * MINUTE, None, 0),
            Resource::Health => (30, None, 0),
            Resource::Dashboard => (2 * MINUTE, None, 1),
        };
        CachePolicy {
            stale_time: Duration::from_secs(stale_secs),
            refetch_interval: refetch_secs.map(Duration::from_secs),
            retry,
        }
    }
}

/// Cache key: a resource plus the parameters that select it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    JournalEntries { mood: Option<Mood>, skip: u32, limit: u32 },
    NudgeCheck,
    WeeklyInsights { days: u32 },
    InsightsStats { days: u32 },
    JournalingStreak,
    UserProfile,
    Health,
    Dashboard,
}

impl QueryKey {
    pub fn resource(&self) -> Resource {
        match self {
            QueryKey::JournalEntries { .. } => Resource::JournalEntries,
            QueryKey::NudgeCheck => Resource::NudgeCheck,
            QueryKey::WeeklyInsights { .. } => Resource::WeeklyInsights,
            QueryKey::InsightsStats { .. } => Resource::InsightsStats,
            QueryKey::JournalingStreak => Resource::JournalingStreak,
            QueryKey::UserProfile => Resource::UserProfile,
            QueryKey::Health => Resource::Health,
            QueryKey::Dashboard => Resource::Dashboard,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.resource().policy()
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    invalidated: bool,
    polling: bool,
}

/// Typed values stored behind [`QueryKey`]s.
#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly fetched value. Polling follows the resource policy.
    pub fn insert<T: Send + Sync + 'static>(&mut self, key: QueryKey, value: T, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                fetched_at: now,
                invalidated: false,
                polling: true,
            },
        );
    }

    /// Choose whether the entry for `key` takes part in background polling.
    pub fn set_polling(&mut self, key: &QueryKey, polling: bool) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.polling = polling;
        }
    }

    /// The value for `key` if it is still fresh.
    pub fn get_fresh<T: Clone + 'static>(&self, key: &QueryKey, now: Instant) -> Option<T> {
        if !self.is_fresh(key, now) {
            return None;
        }
        self.get_any(key)
    }

    /// The last value fetched for `key`, however old.
    pub fn get_any<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned()
    }

    pub fn is_fresh(&self, key: &QueryKey, now: Instant) -> bool {
        self.entries.get(key).is_some_and(|entry| {
            !entry.invalidated
                && now.saturating_duration_since(entry.fetched_at) < key.policy().stale_time
        })
    }

    /// Mark every entry of `resource` stale. Returns how many were affected.
    pub fn invalidate(&mut self, resource: Resource) -> usize {
        let mut count = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.resource() == resource {
                entry.invalidated = true;
                count += 1;
            }
        }
        count
    }

    /// Mark the entry for `key` stale, leaving other keys of its resource
    /// alone. Returns whether an entry existed.
    pub fn invalidate_key(&mut self, key: &QueryKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.invalidated = true;
                true
            }
            None => false,
        }
    }

    /// Keys that should be refetched in the background at `now`: invalidated
    /// entries, and polling entries whose refetch interval elapsed.
    pub fn refetch_due(&self, now: Instant) -> Vec<QueryKey> {
        let mut due: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|(key, entry)| {
                if entry.invalidated {
                    return true;
                }
                match key.policy().refetch_interval {
                    Some(interval) if entry.polling => {
                        now.saturating_duration_since(entry.fetched_at) >= interval
                    }
                    _ => false,
                }
            })
            .map(|(key, _)| *key)
            .collect();
        due.sort_by_key(|key| format!("{key:?}"));
        due
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal_key() -> QueryKey {
        QueryKey::JournalEntries {
            mood: None,
            skip: 0,
            limit: 20,
        }
    }

    #[test]
    fn test_policies() {
        let journal = Resource::JournalEntries.policy();
        assert_eq!(journal.stale_time, Duration::from_secs(120));
        assert_eq!(journal.refetch_interval, Some(Duration::from_secs(10)));
        assert_eq!(journal.retry, 2);

        let insights = Resource::WeeklyInsights.policy();
        assert!(insights.stale_time > Resource::NudgeCheck.policy().stale_time);
        assert_eq!(Resource::UserProfile.policy().retry, 0);
    }

    #[test]
    fn test_fresh_until_stale_time() {
        let mut cache = QueryCache::new();
        let t0 = Instant::now();
        cache.insert(QueryKey::NudgeCheck, 7_u32, t0);

        assert_eq!(
            cache.get_fresh::<u32>(&QueryKey::NudgeCheck, t0 + Duration::from_secs(299)),
            Some(7)
        );
        assert_eq!(
            cache.get_fresh::<u32>(&QueryKey::NudgeCheck, t0 + Duration::from_secs(300)),
            None
        );
        assert_eq!(cache.get_any::<u32>(&QueryKey::NudgeCheck), Some(7));
        // Wrong type never matches
        assert_eq!(cache.get_any::<String>(&QueryKey::NudgeCheck), None);
    }

    #[test]
    fn test_invalidate_by_resource() {
        let mut cache = QueryCache::new();
        let t0 = Instant::now();
        cache.insert(QueryKey::InsightsStats { days: 7 }, 1_u32, t0);
        cache.insert(QueryKey::InsightsStats { days: 30 }, 2_u32, t0);
        cache.insert(QueryKey::JournalingStreak, 3_u32, t0);

        assert_eq!(cache.invalidate(Resource::InsightsStats), 2);
        assert!(!cache.is_fresh(&QueryKey::InsightsStats { days: 7 }, t0));
        assert!(cache.is_fresh(&QueryKey::JournalingStreak, t0));
        assert_eq!(cache.refetch_due(t0).len(), 2);
    }

    #[test]
    fn test_invalidate_single_key() {
        let mut cache = QueryCache::new();
        let t0 = Instant::now();
        let calm = QueryKey::JournalEntries {
            mood: Some(Mood::Calm),
            skip: 0,
            limit: 20,
        };
        cache.insert(journal_key(), 1_u32, t0);
        cache.insert(calm, 2_u32, t0);

        assert!(cache.invalidate_key(&journal_key()));
        assert!(!cache.is_fresh(&journal_key(), t0));
        assert!(cache.is_fresh(&calm, t0));
        assert_eq!(cache.refetch_due(t0), vec![journal_key()]);
        assert!(!cache.invalidate_key(&QueryKey::Health));
    }

    #[test]
    fn test_journal_polls_only_when_flagged() {
        let mut cache = QueryCache::new();
        let t0 = Instant::now();
        cache.insert(journal_key(), (), t0);
        cache.set_polling(&journal_key(), false);
        assert!(cache.refetch_due(t0 + Duration::from_secs(60)).is_empty());

        cache.set_polling(&journal_key(), true);
        assert!(cache.refetch_due(t0 + Duration::from_secs(9)).is_empty());
        assert_eq!(
            cache.refetch_due(t0 + Duration::from_secs(10)),
            vec![journal_key()]
        );
    }

    #[test]
    fn test_non_polling_resources_never_due() {
        let mut cache = QueryCache::new();
        let t0 = Instant::now();
        cache.insert(QueryKey::WeeklyInsights { days: 7 }, (), t0);
        assert!(cache.refetch_due(t0 + Duration::from_secs(86_400)).is_empty());
    }
}
