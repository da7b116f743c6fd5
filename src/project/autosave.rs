// Debounced autosave
//
// Every edit restarts the countdown; the document is written once the
// editor has been quiet for `delay`. `AutosaveScheduler` only keeps time,
// `Autosaver` polls an editor and writes through a `ProjectManager`.

use crate::editor::EditorState;
use crate::messaging::notification::Notification;
use crate::project::manager::{ProjectError, ProjectManager};
use crate::project::store::KeyValueStore;
use log::{debug, warn};
use std::time::{Duration, Instant};

/// Default quiet period before an autosave fires
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    delay: Duration,
    /// Time of the most recent unsaved change
    dirty_since: Option<Instant>,
    /// Editor revision covered by the last successful save
    saved_revision: Option<u64>,
    /// Last revision passed to `observe_revision`
    seen_revision: Option<u64>,
}

impl AutosaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            dirty_since: None,
            saved_revision: None,
            seen_revision: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a change at `now`, restarting the debounce window
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    /// Poll the editor revision; a new unsaved revision restarts the window
    pub fn observe_revision(&mut self, revision: u64, now: Instant) {
        if self.seen_revision == Some(revision) {
            return;
        }
        self.seen_revision = Some(revision);
        if self.saved_revision != Some(revision) {
            self.dirty_since = Some(now);
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// True once the document has been quiet for the full delay
    pub fn is_due(&self, now: Instant) -> bool {
        self.dirty_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.delay)
    }

    /// Time left until the pending save fires
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.dirty_since
            .map(|since| self.delay.saturating_sub(now.saturating_duration_since(since)))
    }

    pub fn mark_saved(&mut self, revision: u64) {
        self.dirty_since = None;
        self.saved_revision = Some(revision);
    }
}

impl Default for AutosaveScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_DELAY)
    }
}

/// Saves the editor's current document once it has been quiet long enough
#[derive(Debug, Clone)]
pub struct Autosaver {
    scheduler: AutosaveScheduler,
    manager: ProjectManager,
}

impl Autosaver {
    pub fn new(manager: ProjectManager, delay: Duration) -> Self {
        Self {
            scheduler: AutosaveScheduler::new(delay),
            manager,
        }
    }

    /// Builder: `revision` is already in the store, e.g. a freshly loaded document
    pub fn assume_saved(mut self, revision: u64) -> Self {
        self.scheduler.mark_saved(revision);
        self
    }

    pub fn scheduler(&self) -> &AutosaveScheduler {
        &self.scheduler
    }

    /// Poll the editor; returns true if the document was written
    ///
    /// A failed write leaves the document dirty, so the next tick after
    /// another quiet period retries it. The failure is also pushed to the
    /// editor's notification channel.
    pub fn tick(
        &mut self,
        editor: &mut EditorState,
        store: &mut dyn KeyValueStore,
        now: Instant,
    ) -> Result<bool, ProjectError> {
        self.scheduler.observe_revision(editor.revision(), now);
        if !self.scheduler.is_due(now) {
            return Ok(false);
        }
        self.save(editor, store, now)
    }

    /// Write any unsaved revision now, ignoring the debounce window
    pub fn flush(
        &mut self,
        editor: &mut EditorState,
        store: &mut dyn KeyValueStore,
        now: Instant,
    ) -> Result<bool, ProjectError> {
        self.scheduler.observe_revision(editor.revision(), now);
        if !self.scheduler.is_dirty() {
            return Ok(false);
        }
        self.save(editor, store, now)
    }

    fn save(
        &mut self,
        editor: &mut EditorState,
        store: &mut dyn KeyValueStore,
        now: Instant,
    ) -> Result<bool, ProjectError> {
        let revision = editor.revision();
        match self.manager.save_project(store, editor.project()) {
            Ok(()) => {
                self.scheduler.mark_saved(revision);
                debug!("Autosaved revision {}", revision);
                Ok(true)
            }
            Err(e) => {
                warn!("Autosave of revision {} failed: {}", revision, e);
                self.scheduler.mark_dirty(now);
                editor.notify(Notification::save_failed(&e));
                Err(e)
            }
        }
    }
}
