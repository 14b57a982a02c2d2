//! Keeps document-level presentation in step with the preferences.
//!
//! The dark-mode flag follows the theme (or the OS scheme while the theme is
//! `system`), and the language sets the document `lang` and text direction.
//! Changes arrive over channels and are applied by [`PresentationSync::pump`].

use crate::store::state::{Store, StoreEvent};
use crate::store::types::{Language, Theme, UserPreferences};
use crossbeam_channel::{Receiver, TryRecvError};

/// Operating system color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

/// Text direction of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

impl From<Language> for TextDirection {
    fn from(language: Language) -> Self {
        if language.is_rtl() {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        }
    }
}

/// Receiver of document-level presentation changes.
pub trait DocumentSink {
    fn set_dark_mode(&mut self, dark: bool);
    fn set_locale(&mut self, lang: &str, dir: TextDirection);
}

/// In-memory document attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentAttributes {
    pub dark: bool,
    pub lang: String,
    pub dir: TextDirection,
}

impl Default for DocumentAttributes {
    fn default() -> Self {
        Self {
            dark: false,
            lang: Language::En.as_str().to_string(),
            dir: TextDirection::Ltr,
        }
    }
}

impl DocumentSink for DocumentAttributes {
    fn set_dark_mode(&mut self, dark: bool) {
        self.dark = dark;
    }

    fn set_locale(&mut self, lang: &str, dir: TextDirection) {
        self.lang = lang.to_string();
        self.dir = dir;
    }
}

/// Whether `theme` renders dark given the OS scheme.
pub fn is_dark(theme: Theme, os: ColorScheme) -> bool {
    match theme {
        Theme::Light => false,
        Theme::Dark => true,
        Theme::System => os == ColorScheme::Dark,
    }
}

/// Applies preference and OS scheme changes to a [`DocumentSink`].
///
/// Dropping the sync drops both subscriptions.
pub struct PresentationSync<S: DocumentSink> {
    sink: S,
    store_events: Receiver<StoreEvent>,
    os_schemes: Receiver<ColorScheme>,
    theme: Theme,
    language: Language,
    os: ColorScheme,
}

impl<S: DocumentSink> PresentationSync<S> {
    /// Start syncing from `preferences`, applying them to `sink` right away.
    pub fn new(
        mut sink: S,
        preferences: &UserPreferences,
        store_events: Receiver<StoreEvent>,
        os_schemes: Receiver<ColorScheme>,
        os: ColorScheme,
    ) -> Self {
        sink.set_dark_mode(is_dark(preferences.theme, os));
        sink.set_locale(preferences.language.as_str(), preferences.language.into());

        Self {
            sink,
            store_events,
            os_schemes,
            theme: preferences.theme,
            language: preferences.language,
            os,
        }
    }

    /// Subscribe to `store` and start syncing from its current preferences.
    pub fn attach(
        store: &mut Store,
        sink: S,
        os_schemes: Receiver<ColorScheme>,
        os: ColorScheme,
    ) -> Self {
        let preferences = store.snapshot().preferences.clone();
        let events = store.subscribe();
        Self::new(sink, &preferences, events, os_schemes, os)
    }

    /// Apply every pending change. Returns how many sink updates were made.
    pub fn pump(&mut self) -> usize {
        let mut theme = self.theme;
        let mut language = self.language;
        let mut os = self.os;

        loop {
            match self.store_events.try_recv() {
                Ok(StoreEvent::PreferencesChanged(preferences)) => {
                    theme = preferences.theme;
                    language = preferences.language;
                }
                Ok(_) => {}
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        while let Ok(scheme) = self.os_schemes.try_recv() {
            os = scheme;
        }

        let mut updates = 0;
        let was_dark = is_dark(self.theme, self.os);
        let dark = is_dark(theme, os);
        if dark != was_dark {
            tracing::debug!(dark, "Dark mode changed");
            self.sink.set_dark_mode(dark);
            updates += 1;
        }
        if language != self.language {
            tracing::debug!(%language, "Document language changed");
            self.sink.set_locale(language.as_str(), language.into());
            updates += 1;
        }

        self.theme = theme;
        self.language = language;
        self.os = os;
        updates
    }

    pub fn is_dark(&self) -> bool {
        is_dark(self.theme, self.os)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::slot::MemorySlot;

    fn attached(os: ColorScheme) -> (Store, PresentationSync<DocumentAttributes>, crossbeam_channel::Sender<ColorScheme>) {
        let mut store = Store::open(MemorySlot::new("sakina-store"));
        let (os_tx, os_rx) = crossbeam_channel::unbounded();
        let sync = PresentationSync::attach(&mut store, DocumentAttributes::default(), os_rx, os);
        (store, sync, os_tx)
    }

    #[test]
    fn test_arabic_sets_rtl() {
        let (mut store, mut sync, _os) = attached(ColorScheme::Light);
        store.set_language(Language::Ar).unwrap();
        assert_eq!(sync.pump(), 1);
        assert_eq!(sync.sink().lang, "ar");
        assert_eq!(sync.sink().dir, TextDirection::Rtl);
        assert_eq!(sync.sink().dir.as_str(), "rtl");

        store.set_language(Language::En).unwrap();
        sync.pump();
        assert_eq!(sync.sink().lang, "en");
        assert_eq!(sync.sink().dir, TextDirection::Ltr);
    }

    #[test]
    fn test_explicit_theme_ignores_os() {
        let (mut store, mut sync, os) = attached(ColorScheme::Light);
        assert!(!sync.sink().dark);

        store.set_theme(Theme::Dark).unwrap();
        sync.pump();
        assert!(sync.sink().dark);

        os.send(ColorScheme::Light).unwrap();
        assert_eq!(sync.pump(), 0);
        assert!(sync.sink().dark);
    }

    #[test]
    fn test_system_theme_follows_os() {
        let (mut store, mut sync, os) = attached(ColorScheme::Dark);
        assert!(!sync.sink().dark);

        store.set_theme(Theme::System).unwrap();
        sync.pump();
        assert!(sync.sink().dark);

        os.send(ColorScheme::Light).unwrap();
        sync.pump();
        assert!(!sync.sink().dark);
        assert!(!sync.is_dark());
    }

    #[test]
    fn test_unrelated_events_change_nothing() {
        let (mut store, mut sync, _os) = attached(ColorScheme::Light);
        store
            .add_journal_entry(crate::store::types::NewJournalEntry::text("hi", None))
            .unwrap();
        assert_eq!(sync.pump(), 0);
        assert_eq!(sync.into_sink(), DocumentAttributes::default());
    }
}
