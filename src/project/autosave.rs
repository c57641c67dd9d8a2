// Autosave - debounced persistence of the store to a ProjectStorage
//
// The store bumps its revision on every applied edit. `AutoSave` notices
// the change, waits until no further change has been seen for the debounce
// window, then writes a single export. Hydration sets the baseline, so the
// freshly loaded project is not written straight back.

use crate::config::SequencerConfig;
use crate::project::storage::{FileStorage, ProjectStorage};
use crate::project::types::ImportReport;
use crate::project::ProjectResult;
use crate::store::TimelineStore;
use std::time::{Duration, Instant};

/// Storage key for the working project
pub const AUTOSAVE_KEY: &str = "sinesth-project";

pub struct AutoSave<S: ProjectStorage> {
    storage: S,
    key: String,
    debounce: Duration,
    /// Revision last written (or loaded)
    saved_revision: u64,
    /// Revision last observed
    seen_revision: u64,
    /// When the latest unsaved change was first observed
    pending_since: Option<Instant>,
    writes: u64,
}

impl<S: ProjectStorage> AutoSave<S> {
    pub fn new(storage: S, debounce: Duration) -> Self {
        Self::with_key(storage, AUTOSAVE_KEY, debounce)
    }

    pub fn with_key(storage: S, key: &str, debounce: Duration) -> Self {
        Self {
            storage,
            key: key.to_string(),
            debounce,
            saved_revision: 0,
            seen_revision: 0,
            pending_since: None,
            writes: 0,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Number of writes performed
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Load the saved project (if any) into the store and set the baseline
    ///
    /// A stored document that fails to import leaves the store untouched and
    /// returns the error; the baseline is still set so nothing is written
    /// until the user edits.
    pub fn hydrate(&mut self, store: &mut TimelineStore) -> ProjectResult<Option<ImportReport>> {
        let loaded = match self.storage.get(&self.key)? {
            Some(json) => {
                let result = store.import_project(&json);
                self.mark_saved(store.revision());
                Some(result?)
            }
            None => {
                log::debug!("No saved project under '{}'", self.key);
                self.mark_saved(store.revision());
                None
            }
        };

        Ok(loaded)
    }

    fn mark_saved(&mut self, revision: u64) {
        self.saved_revision = revision;
        self.seen_revision = revision;
        self.pending_since = None;
    }

    pub fn is_dirty(&self, store: &TimelineStore) -> bool {
        store.revision() != self.saved_revision
    }

    /// Record that the store may have changed; restarts the debounce window
    pub fn observe(&mut self, store: &TimelineStore, now: Instant) {
        let revision = store.revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.pending_since = if revision == self.saved_revision {
                None
            } else {
                Some(now)
            };
        }
    }

    /// Write if a change has been quiet for the debounce window
    pub fn flush_if_due(&mut self, store: &TimelineStore, now: Instant) -> ProjectResult<bool> {
        self.observe(store, now);

        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.debounce => self.save(store),
            _ => Ok(false),
        }
    }

    /// Write now if there is anything unsaved
    pub fn flush(&mut self, store: &TimelineStore) -> ProjectResult<bool> {
        if !self.is_dirty(store) {
            return Ok(false);
        }
        self.save(store)
    }

    fn save(&mut self, store: &TimelineStore) -> ProjectResult<bool> {
        let json = store.export_json()?;
        self.storage.set(&self.key, &json)?;
        self.mark_saved(store.revision());
        self.writes += 1;

        log::debug!("Autosaved revision {} to '{}'", store.revision(), self.key);
        Ok(true)
    }
}

impl AutoSave<FileStorage> {
    /// File-backed autosave under the configured storage directory
    pub fn from_config(config: &SequencerConfig) -> Self {
        Self::new(
            FileStorage::new(config.resolved_storage_dir()),
            Duration::from_millis(config.autosave_debounce_ms),
        )
    }
}
