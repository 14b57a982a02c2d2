//! Sakina Companion - local-first wellness companion.
//!
//! This library provides the state and logic behind the companion: a mood
//! journal, short guided calm sessions, proactive nudges, and a synthetic
//! bio-load view, with optional access to a remote AI backend.
//!
//! # Local Data
//!
//! - **One slot**: All local state lives in a single JSON slot on this device
//! - **Named actions**: The slot is only changed through store actions
//! - **All or nothing**: A failed write leaves the previous state in place
//! - **Simulated signals**: Bio-load trends are generated, not measured
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Sakina Companion                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │   Session   │──▶│    Store    │──▶│ Presentation│         │
//! │  │   Runner    │   │ (JSON slot) │   │    Sync     │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         ▲                 ▲                                   │
//! │         │                 │                                   │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │   Catalog   │   │ Data Access │──▶│ AI Backend  │         │
//! │  │  Bio Trends │   │  (cached)   │   │   (REST)    │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sakina_companion::store::{FileSlot, NewJournalEntry, Store};
//! use sakina_companion::store::types::Mood;
//!
//! let mut store = Store::open(FileSlot::new("/tmp/sakina", "sakina-store"));
//! let entry = store
//!     .add_journal_entry(NewJournalEntry::text("Feeling overwhelmed", Some(Mood::Stressed)))
//!     .expect("Failed to save entry");
//! assert_eq!(store.snapshot().journal_history[0].id, entry.id);
//! ```

pub mod config;
pub mod core;
pub mod presentation;
pub mod routing;
pub mod session;
pub mod store;

#[cfg(feature = "api")]
pub mod api;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{generate_bio_trends, BioTrendConfig, BioTrendPoint, TrendSummary};
pub use presentation::{ColorScheme, DocumentAttributes, DocumentSink, PresentationSync};
pub use routing::{guard, ProfileState, Route, RouteDecision};
pub use session::{Completion, SessionError, SessionRunner, Stage};
pub use store::{create_shared_store, SharedStore, Store, StoreError, StoreEvent};

// API re-exports (when enabled)
#[cfg(feature = "api")]
pub use api::{ApiClient, ApiError, BackendStatus, BlockingApiClient, DataAccess, ProfileStatus};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Data notice that can be displayed to users.
pub const DATA_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                  SAKINA COMPANION - YOUR DATA                    ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  ✓ KEPT ON THIS DEVICE:                                          ║
║    • Your preferences (theme, language, notifications)           ║
║    • Your journal entries and moods                              ║
║    • Your completed calm sessions                                ║
║                                                                  ║
║  ✓ SENT TO THE BACKEND (only when you sync or ask for insights): ║
║    • Journal text for AI analysis                                ║
║    • Completed session durations                                 ║
║                                                                  ║
║  ✗ NOT MEASURED:                                                 ║
║    • Bio-load trends are simulated for illustration only         ║
║                                                                  ║
║  You can review what is stored anytime with:                     ║
║    sakina status                                                 ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_notice_contents() {
        assert!(DATA_NOTICE.contains("YOUR DATA"));
        assert!(DATA_NOTICE.contains("NOT MEASURED"));
        assert!(DATA_NOTICE.contains("sakina status"));
    }
}
