// EditorState - The single mutable state of an authoring session
//
// All document changes go through this struct: edits commit new snapshots
// to the history, undo/redo move its cursor, and generation results are
// applied through the same methods. Transient fields (streaming buffer,
// session status) never enter a snapshot.

use crate::editor::action::{EditAction, EditResult};
use crate::history::{DEFAULT_MAX_HISTORY, History};
use crate::messaging::channels::{MessageConsumer, NotificationProducer};
use crate::messaging::command::EditorMessage;
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::project::types::ProjectSnapshot;
use chrono::Utc;
use log::{debug, info, warn};
use ringbuf::traits::{Consumer, Producer};
use std::sync::{Arc, Mutex};

/// Whether generation requests can be issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Ready,
    /// Credentials were rejected; the user has to select them again
    Unconfigured,
}

pub struct EditorState {
    history: History<ProjectSnapshot>,

    /// A story stream is in progress
    is_streaming: bool,

    /// Text received so far from the story stream
    streaming_content: String,

    session: SessionStatus,

    /// Bumped on every change to the current document
    revision: u64,

    /// Notification sender towards the UI
    /// Wrapped in Arc<Mutex<>> so generation tasks and the editor can share it
    notification_sender: Option<Arc<Mutex<NotificationProducer>>>,
}

impl EditorState {
    /// Start a session on `project` with the default history limit
    pub fn new(project: ProjectSnapshot) -> Self {
        Self::with_history_limit(project, DEFAULT_MAX_HISTORY)
    }

    pub fn with_history_limit(project: ProjectSnapshot, max_history: usize) -> Self {
        Self {
            history: History::with_capacity(project, max_history),
            is_streaming: false,
            streaming_content: String::new(),
            session: SessionStatus::Ready,
            revision: 0,
            notification_sender: None,
        }
    }

    /// Builder: route notifications into a ring buffer
    pub fn with_notifications(mut self, sender: Arc<Mutex<NotificationProducer>>) -> Self {
        self.notification_sender = Some(sender);
        self
    }

    /// Current document
    pub fn current(&self) -> Arc<ProjectSnapshot> {
        self.history.current()
    }

    pub fn project(&self) -> &ProjectSnapshot {
        self.history.current_ref()
    }

    pub fn history(&self) -> &History<ProjectSnapshot> {
        &self.history
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply an edit and commit the result
    ///
    /// Returns `Ok(false)` when the edit changed nothing, in which case no
    /// history entry is created.
    pub fn apply(&mut self, action: &EditAction) -> EditResult<bool> {
        let current = self.history.current_ref();
        let mut next = current.clone();
        action.apply(&mut next)?;

        if next == *current {
            debug!("Edit \"{}\" changed nothing", action.description());
            return Ok(false);
        }

        next.updated_at = Utc::now();
        self.history.push(next);
        self.revision += 1;

        debug!(
            "Committed \"{}\" (history {}/{})",
            action.description(),
            self.history.cursor() + 1,
            self.history.len()
        );
        Ok(true)
    }

    /// Commit an arbitrary mutation as a new history entry
    pub fn commit_with<F>(&mut self, mutator: F) -> Arc<ProjectSnapshot>
    where
        F: FnOnce(&mut ProjectSnapshot),
    {
        let now = Utc::now();
        let committed = self.history.commit(|project| {
            mutator(project);
            project.updated_at = now;
        });
        self.revision += 1;
        committed
    }

    /// Change the current document without creating an undo step
    ///
    /// Used for transient per-entity status flips such as `generating`.
    pub fn update_untracked<F>(&mut self, mutator: F) -> Arc<ProjectSnapshot>
    where
        F: FnOnce(&mut ProjectSnapshot),
    {
        let updated = self.history.replace_current(mutator);
        self.revision += 1;
        updated
    }

    /// Rewrite every history entry matching `needs`, without an undo step
    ///
    /// Used to clear a transient status from snapshots the cursor can still
    /// reach through undo or redo. Returns how many entries changed.
    pub fn patch_untracked<P, F>(&mut self, needs: P, mutator: F) -> usize
    where
        P: Fn(&ProjectSnapshot) -> bool,
        F: FnMut(&mut ProjectSnapshot),
    {
        let patched = self.history.patch_where(needs, mutator);
        if patched > 0 {
            self.revision += 1;
        }
        patched
    }

    /// Step back; returns false at the oldest snapshot
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(_) => {
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Step forward; returns false at the newest snapshot
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(_) => {
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Replace the whole session with a loaded document as the only entry
    pub fn load(&mut self, project: ProjectSnapshot) {
        info!("Loading project {} into editor", project.id);
        self.history.reset(project);
        self.is_streaming = false;
        self.streaming_content.clear();
        self.revision += 1;
    }

    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    pub fn streaming_content(&self) -> &str {
        &self.streaming_content
    }

    /// Start a new story stream, discarding any previous buffer
    pub fn begin_stream(&mut self) {
        self.is_streaming = true;
        self.streaming_content.clear();
    }

    /// Append received text; ignored when no stream is active
    pub fn push_stream_chunk(&mut self, chunk: &str) {
        if self.is_streaming {
            self.streaming_content.push_str(chunk);
        }
    }

    /// Stop streaming and hand back the accumulated text
    pub fn end_stream(&mut self) -> String {
        self.is_streaming = false;
        std::mem::take(&mut self.streaming_content)
    }

    pub fn session(&self) -> SessionStatus {
        self.session
    }

    pub fn is_configured(&self) -> bool {
        self.session == SessionStatus::Ready
    }

    /// Downgrade after an authentication failure
    pub fn mark_unconfigured(&mut self) {
        if self.session != SessionStatus::Unconfigured {
            warn!("Generation credentials rejected, session is now unconfigured");
        }
        self.session = SessionStatus::Unconfigured;
    }

    pub fn reconfigure(&mut self) {
        self.session = SessionStatus::Ready;
    }

    /// Push a notification to the UI
    ///
    /// Returns false if there is no listener or the ring buffer is full.
    pub fn notify(&mut self, notification: Notification) -> bool {
        let Some(sender) = &self.notification_sender else {
            return false;
        };

        let pushed = match sender.lock() {
            Ok(mut sender) => sender.try_push(notification).is_ok(),
            Err(_) => false,
        };
        if !pushed {
            warn!("Notification dropped (ring buffer full)");
        }
        pushed
    }

    /// Handle one queued message
    pub fn process(&mut self, message: EditorMessage) -> EditResult<bool> {
        match message {
            EditorMessage::Edit(action) => self.apply(&action),
            EditorMessage::Undo => Ok(self.undo()),
            EditorMessage::Redo => Ok(self.redo()),
            EditorMessage::Reconfigure => {
                self.reconfigure();
                Ok(true)
            }
        }
    }

    /// Apply every queued message in order
    ///
    /// Rejected edits raise a notification and do not stop the drain.
    /// Returns the number of messages that changed state.
    pub fn drain(&mut self, consumer: &mut MessageConsumer) -> usize {
        let mut changed = 0;
        while let Some(message) = consumer.try_pop() {
            match self.process(message) {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Edit rejected: {}", e);
                    self.notify(Notification::warning(
                        NotificationCategory::Editor,
                        e.to_string(),
                    ));
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::{create_editor_channel, create_notification_channel};
    use crate::messaging::notification::NotificationLevel;
    use crate::project::types::{Idea, Scene};

    fn idea(theme: &str) -> Idea {
        Idea {
            theme: theme.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_undo_restores_previous_idea() {
        let mut state = EditorState::new(ProjectSnapshot::default());
        state.apply(&EditAction::UpdateIdea(idea("A"))).unwrap();
        state.apply(&EditAction::UpdateIdea(idea("B"))).unwrap();

        assert!(state.undo());
        assert_eq!(state.project().idea.theme, "A");
        assert!(state.redo());
        assert_eq!(state.project().idea.theme, "B");
    }

    #[test]
    fn test_noop_edit_is_not_committed() {
        let mut state = EditorState::new(ProjectSnapshot::default());
        let title = state.project().title.clone();

        assert!(!state.apply(&EditAction::SetTitle(title)).unwrap());
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.revision(), 0);
    }

    #[test]
    fn test_rejected_edit_leaves_history() {
        let mut state = EditorState::new(ProjectSnapshot::default());
        let result = state.apply(&EditAction::ReorderScenes { from: 0, to: 1 });
        assert!(result.is_err());
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn test_commit_updates_timestamp() {
        let mut state = EditorState::new(ProjectSnapshot::default());
        let before = state.project().updated_at;
        state.apply(&EditAction::SetTitle("Later".into())).unwrap();
        assert!(state.project().updated_at >= before);
        assert_eq!(state.project().created_at, state.history().get(0).unwrap().created_at);
    }

    #[test]
    fn test_untracked_update_has_no_undo_step() {
        let mut state = EditorState::new(ProjectSnapshot::default());
        state.apply(&EditAction::AddScene(Scene::new(0, "One"))).unwrap();

        state.update_untracked(|p| p.scenes[0].title = "Flipped".into());

        assert_eq!(state.history().len(), 2);
        assert_eq!(state.project().scenes[0].title, "Flipped");
        assert!(state.undo());
        assert!(state.project().scenes.is_empty());
    }

    #[test]
    fn test_streaming_buffer() {
        let mut state = EditorState::new(ProjectSnapshot::default());
        state.push_stream_chunk("ignored");
        assert_eq!(state.streaming_content(), "");

        state.begin_stream();
        state.push_stream_chunk("{\"syn");
        state.push_stream_chunk("opsis\"");
        assert!(state.is_streaming());
        assert_eq!(state.streaming_content(), "{\"synopsis\"");

        let text = state.end_stream();
        assert_eq!(text, "{\"synopsis\"");
        assert!(!state.is_streaming());
        assert_eq!(state.streaming_content(), "");
    }

    #[test]
    fn test_load_resets_history() {
        let mut state = EditorState::new(ProjectSnapshot::default());
        state.apply(&EditAction::SetTitle("Edited".into())).unwrap();

        let mut loaded = ProjectSnapshot::default();
        loaded.title = "Loaded".into();
        state.load(loaded);

        assert_eq!(state.history().len(), 1);
        assert_eq!(state.project().title, "Loaded");
        assert!(!state.undo());
    }

    #[test]
    fn test_drain_processes_in_order() {
        let (notif_tx, mut notif_rx) = create_notification_channel(8);
        let mut state = EditorState::new(ProjectSnapshot::default())
            .with_notifications(Arc::new(Mutex::new(notif_tx)));
        let (mut tx, mut rx) = create_editor_channel(16);

        tx.try_push(EditorMessage::Edit(EditAction::SetTitle("One".into()))).unwrap();
        tx.try_push(EditorMessage::Edit(EditAction::SetTitle("Two".into()))).unwrap();
        tx.try_push(EditorMessage::Undo).unwrap();
        tx.try_push(EditorMessage::Edit(EditAction::RemoveScene { id: "x".into() })).unwrap();

        let changed = state.drain(&mut rx);

        assert_eq!(changed, 3);
        assert_eq!(state.project().title, "One");
        let notification = notif_rx.try_pop().unwrap();
        assert_eq!(notification.level, NotificationLevel::Warning);
        assert!(notification.message.contains("Scene not found"));
    }

    #[test]
    fn test_session_status() {
        let mut state = EditorState::new(ProjectSnapshot::default());
        assert!(state.is_configured());
        state.mark_unconfigured();
        assert_eq!(state.session(), SessionStatus::Unconfigured);
        state.process(EditorMessage::Reconfigure).unwrap();
        assert!(state.is_configured());
    }

    #[test]
    fn test_notify_without_listener() {
        let mut state = EditorState::new(ProjectSnapshot::default());
        assert!(!state.notify(Notification::info(NotificationCategory::Editor, "hi")));
    }
}
