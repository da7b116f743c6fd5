// GenerationCoordinator - Runs generation requests against the editor state
//
// Every request has three phases: `begin_*` marks the entity as generating
// and issues a ticket, the service call runs without any lock held, and
// `finish_*` applies the result only if the ticket is still the newest one
// for that entity and the entity is still generating in the current
// snapshot. Anything else is a stale response and is dropped.

use crate::editor::EditorState;
use crate::generation::prompt;
use crate::generation::service::{
    GenerationError, GenerationService, ImageRequest, PortraitRequest, SpeechRequest,
    StoryRequest,
};
use crate::generation::stream::StoryStream;
use crate::generation::tracker::{EntityKey, RequestTicket, RequestTracker};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::project::types::{GenerationStatus, ProjectSnapshot, SceneAudio};
use futures::StreamExt;
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

/// A request that has been started and is waiting for its result
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob<R> {
    pub ticket: RequestTicket,
    pub request: R,
    /// Entity status before it was flipped to generating
    pub previous: GenerationStatus,
}

fn category_of(key: &EntityKey) -> NotificationCategory {
    match key {
        EntityKey::SceneImage(_) => NotificationCategory::Image,
        EntityKey::SceneAudio(_) => NotificationCategory::Audio,
        EntityKey::CharacterAvatar(_) => NotificationCategory::Avatar,
        EntityKey::Story => NotificationCategory::Story,
    }
}

fn entity_status(project: &ProjectSnapshot, key: &EntityKey) -> Option<GenerationStatus> {
    match key {
        EntityKey::SceneImage(id) => project.scene(id).map(|s| s.image.status),
        EntityKey::SceneAudio(id) => project.scene(id).map(|s| s.audio_status()),
        EntityKey::CharacterAvatar(id) => project.character(id).map(|c| c.status),
        EntityKey::Story => None,
    }
}

fn set_entity_status(project: &mut ProjectSnapshot, key: &EntityKey, status: GenerationStatus) {
    match key {
        EntityKey::SceneImage(id) => {
            if let Some(scene) = project.scene_mut(id) {
                scene.image.status = status;
            }
        }
        EntityKey::SceneAudio(id) => {
            if let Some(scene) = project.scene_mut(id) {
                scene.audio.get_or_insert_with(SceneAudio::default).status = status;
            }
        }
        EntityKey::CharacterAvatar(id) => {
            if let Some(character) = project.character_mut(id) {
                character.status = status;
            }
        }
        EntityKey::Story => {}
    }
}

fn apply_payload(project: &mut ProjectSnapshot, key: &EntityKey, payload: String) {
    match key {
        EntityKey::SceneImage(id) => {
            if let Some(scene) = project.scene_mut(id) {
                scene.image.url = Some(payload);
            }
        }
        EntityKey::SceneAudio(id) => {
            if let Some(scene) = project.scene_mut(id) {
                scene.audio.get_or_insert_with(SceneAudio::default).data = Some(payload);
            }
        }
        EntityKey::CharacterAvatar(id) => {
            if let Some(character) = project.character_mut(id) {
                character.reference_image = Some(payload);
            }
        }
        EntityKey::Story => {}
    }
}

pub struct GenerationCoordinator<S> {
    service: Arc<S>,
    state: Arc<Mutex<EditorState>>,
    tracker: Mutex<RequestTracker>,
}

impl<S: GenerationService> GenerationCoordinator<S> {
    pub fn new(service: Arc<S>, state: Arc<Mutex<EditorState>>) -> Self {
        Self {
            service,
            state,
            tracker: Mutex::new(RequestTracker::new()),
        }
    }

    pub fn state(&self) -> &Arc<Mutex<EditorState>> {
        &self.state
    }

    /// Lock order is always state, then tracker
    fn lock_state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_tracker(&self) -> MutexGuard<'_, RequestTracker> {
        self.tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_pending(&self, key: &EntityKey) -> bool {
        self.lock_tracker().is_pending(key)
    }

    fn begin<R>(
        &self,
        key: EntityKey,
        build: impl FnOnce(&ProjectSnapshot) -> Result<R, String>,
    ) -> Option<GenerationJob<R>> {
        let mut state = self.lock_state();
        let category = category_of(&key);

        if !state.is_configured() {
            state.notify(Notification::missing_credentials());
            return None;
        }

        let previous = match entity_status(state.project(), &key) {
            None => {
                warn!("Generation requested for missing entity {:?}", key);
                return None;
            }
            // Regenerating over a request still in flight
            Some(GenerationStatus::Generating) => GenerationStatus::Idle,
            Some(status) => status,
        };

        let request = match build(state.project()) {
            Ok(request) => request,
            Err(reason) => {
                state.notify(Notification::warning(category, reason));
                return None;
            }
        };

        state.update_untracked(|project| {
            set_entity_status(project, &key, GenerationStatus::Generating)
        });
        let ticket = self.lock_tracker().issue(key);
        debug!("Started {:?} (generation {})", ticket.key, ticket.generation);

        Some(GenerationJob {
            ticket,
            request,
            previous,
        })
    }

    /// Put `status` back wherever the history still shows the entity generating
    fn settle(state: &mut EditorState, key: &EntityKey, status: GenerationStatus) {
        state.patch_untracked(
            |project| entity_status(project, key) == Some(GenerationStatus::Generating),
            |project| set_entity_status(project, key, status),
        );
    }

    /// Apply a result; returns true if it was committed
    fn finish<R>(&self, job: &GenerationJob<R>, result: Result<String, GenerationError>) -> bool {
        let key = &job.ticket.key;
        let mut state = self.lock_state();

        if !self.lock_tracker().retire(&job.ticket) {
            debug!("Dropping superseded result for {:?}", key);
            return false;
        }

        let still_generating =
            entity_status(state.project(), key) == Some(GenerationStatus::Generating);
        Self::settle(&mut state, key, job.previous);
        if !still_generating {
            debug!("Dropping result for {:?}, no longer generating", key);
            return false;
        }

        let result = match result {
            Ok(payload) if payload.trim().is_empty() => Err(GenerationError::EmptyResponse),
            other => other,
        };

        match result {
            Ok(payload) => {
                state.commit_with(|project| {
                    apply_payload(project, key, payload);
                    set_entity_status(project, key, GenerationStatus::Completed);
                });
                info!("Generation for {:?} completed", key);
                true
            }
            Err(GenerationError::Unauthorized(message)) => {
                state.update_untracked(|project| {
                    set_entity_status(project, key, GenerationStatus::Idle)
                });
                state.mark_unconfigured();
                state.notify(Notification::credentials_rejected(message));
                false
            }
            Err(e) => {
                warn!("Generation for {:?} failed: {}", key, e);
                state.update_untracked(|project| {
                    set_entity_status(project, key, GenerationStatus::Error)
                });
                state.notify(Notification::error(category_of(key), e.to_string()));
                false
            }
        }
    }

    pub fn begin_scene_image(&self, scene_id: &str) -> Option<GenerationJob<ImageRequest>> {
        self.begin(EntityKey::SceneImage(scene_id.to_string()), |project| {
            project
                .scene(scene_id)
                .map(|scene| prompt::image_request(project, scene))
                .ok_or_else(|| "Scene not found".to_string())
        })
    }

    pub fn finish_scene_image(
        &self,
        job: &GenerationJob<ImageRequest>,
        result: Result<String, GenerationError>,
    ) -> bool {
        self.finish(job, result)
    }

    pub fn begin_scene_audio(&self, scene_id: &str) -> Option<GenerationJob<SpeechRequest>> {
        self.begin(EntityKey::SceneAudio(scene_id.to_string()), |project| {
            let scene = project
                .scene(scene_id)
                .ok_or_else(|| "Scene not found".to_string())?;
            prompt::speech_request(project, scene)
                .ok_or_else(|| format!("Scene \"{}\" has no voiceover", scene.title))
        })
    }

    pub fn finish_scene_audio(
        &self,
        job: &GenerationJob<SpeechRequest>,
        result: Result<String, GenerationError>,
    ) -> bool {
        self.finish(job, result)
    }

    pub fn begin_character_avatar(
        &self,
        character_id: &str,
    ) -> Option<GenerationJob<PortraitRequest>> {
        self.begin(EntityKey::CharacterAvatar(character_id.to_string()), |project| {
            project
                .character(character_id)
                .map(|character| prompt::portrait_request(project, character))
                .ok_or_else(|| "Character not found".to_string())
        })
    }

    pub fn finish_character_avatar(
        &self,
        job: &GenerationJob<PortraitRequest>,
        result: Result<String, GenerationError>,
    ) -> bool {
        self.finish(job, result)
    }

    pub async fn generate_scene_image(&self, scene_id: &str) -> bool {
        let Some(job) = self.begin_scene_image(scene_id) else {
            return false;
        };
        let result = self.service.render_image(job.request.clone()).await;
        self.finish_scene_image(&job, result)
    }

    pub async fn generate_scene_audio(&self, scene_id: &str) -> bool {
        let Some(job) = self.begin_scene_audio(scene_id) else {
            return false;
        };
        let result = self.service.synthesize_speech(job.request.clone()).await;
        self.finish_scene_audio(&job, result)
    }

    pub async fn generate_character_avatar(&self, character_id: &str) -> bool {
        let Some(job) = self.begin_character_avatar(character_id) else {
            return false;
        };
        let result = self.service.render_portrait(job.request.clone()).await;
        self.finish_character_avatar(&job, result)
    }

    /// Render every scene image concurrently; returns how many were applied
    pub async fn generate_all_scene_images(&self) -> usize {
        let scene_ids: Vec<String> = self
            .lock_state()
            .project()
            .scenes
            .iter()
            .map(|scene| scene.id.clone())
            .collect();

        join_all(scene_ids.iter().map(|id| self.generate_scene_image(id)))
            .await
            .into_iter()
            .filter(|applied| *applied)
            .count()
    }

    /// Start a story stream; refuses without credentials or a theme
    pub fn begin_story(&self) -> Option<(RequestTicket, StoryRequest)> {
        let mut state = self.lock_state();

        if !state.is_configured() {
            state.notify(Notification::missing_credentials());
            return None;
        }
        if state.project().idea.theme.trim().is_empty() {
            state.notify(Notification::warning(
                NotificationCategory::Story,
                "Enter a theme before generating a story",
            ));
            return None;
        }

        let request = prompt::story_request(state.project());
        state.begin_stream();
        let ticket = self.lock_tracker().issue(EntityKey::Story);
        Some((ticket, request))
    }

    /// Mirror a chunk into the editor buffer; false once the stream is superseded
    pub fn push_story_chunk(&self, ticket: &RequestTicket, chunk: &str) -> bool {
        let mut state = self.lock_state();
        if !self.lock_tracker().is_current(ticket) {
            return false;
        }
        state.push_stream_chunk(chunk);
        true
    }

    /// Close the stream and commit the parsed story as one undo step
    pub fn finish_story(
        &self,
        ticket: &RequestTicket,
        result: Result<StoryStream, GenerationError>,
    ) -> bool {
        let mut state = self.lock_state();
        if !self.lock_tracker().retire(ticket) {
            debug!("Dropping superseded story stream");
            return false;
        }
        state.end_stream();

        let document = result.and_then(StoryStream::finish);
        match document {
            Ok(document) => {
                let story = document.story();
                let scenes = document.into_scenes();
                let count = scenes.len();
                state.commit_with(move |project| {
                    project.story = story;
                    project.scenes = scenes;
                });
                info!("Story generated with {} scenes", count);
                state.notify(Notification::info(
                    NotificationCategory::Story,
                    format!("Story ready with {} scenes", count),
                ));
                true
            }
            Err(GenerationError::Unauthorized(message)) => {
                state.mark_unconfigured();
                state.notify(Notification::credentials_rejected(message));
                false
            }
            Err(e) => {
                warn!("Story generation failed: {}", e);
                state.notify(Notification::error(NotificationCategory::Story, e.to_string()));
                false
            }
        }
    }

    pub async fn generate_story(&self) -> bool {
        let Some((ticket, request)) = self.begin_story() else {
            return false;
        };

        let mut chunks = match self.service.stream_story(request).await {
            Ok(chunks) => chunks,
            Err(e) => return self.finish_story(&ticket, Err(e)),
        };

        let mut stream = StoryStream::new();
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(text) => {
                    if !self.push_story_chunk(&ticket, &text) {
                        return false;
                    }
                    stream.push(&text);
                }
                Err(e) => return self.finish_story(&ticket, Err(e)),
            }
        }

        self.finish_story(&ticket, Ok(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::service::TextStream;
    use crate::messaging::channels::create_notification_channel;
    use crate::messaging::notification::NotificationLevel;
    use crate::project::types::{Character, Scene};
    use async_trait::async_trait;
    use futures::stream;
    use ringbuf::traits::Consumer;

    struct FixedService {
        image: Result<String, GenerationError>,
        story_chunks: Vec<String>,
    }

    #[async_trait]
    impl GenerationService for FixedService {
        async fn stream_story(&self, _: StoryRequest) -> Result<TextStream, GenerationError> {
            let chunks: Vec<Result<String, GenerationError>> =
                self.story_chunks.iter().cloned().map(Ok).collect();
            Ok(stream::iter(chunks).boxed())
        }

        async fn render_image(&self, _: ImageRequest) -> Result<String, GenerationError> {
            self.image.clone()
        }

        async fn synthesize_speech(&self, _: SpeechRequest) -> Result<String, GenerationError> {
            Ok("AAAA".to_string())
        }

        async fn render_portrait(&self, _: PortraitRequest) -> Result<String, GenerationError> {
            Ok("data:image/png;base64,portrait".to_string())
        }
    }

    fn project() -> ProjectSnapshot {
        let mut project = ProjectSnapshot::default();
        project.idea.theme = "Lighthouse".into();
        let mut scene = Scene::new(0, "Storm");
        scene.id = "s1".into();
        scene.voiceover = "It began that night.".into();
        project.scenes.push(scene);
        let mut character = Character::new("Mira", "Keeper");
        character.id = "c1".into();
        project.characters.push(character);
        project
    }

    fn coordinator(
        image: Result<String, GenerationError>,
    ) -> GenerationCoordinator<FixedService> {
        let service = FixedService {
            image,
            story_chunks: Vec::new(),
        };
        let state = Arc::new(Mutex::new(EditorState::new(project())));
        GenerationCoordinator::new(Arc::new(service), state)
    }

    fn scene_image(coord: &GenerationCoordinator<FixedService>) -> (GenerationStatus, Option<String>) {
        let state = coord.lock_state();
        let scene = state.project().scene("s1").unwrap().clone();
        (scene.image.status, scene.image.url)
    }

    #[test]
    fn test_begin_marks_generating_without_undo_step() {
        let coord = coordinator(Ok("img".into()));
        let job = coord.begin_scene_image("s1").unwrap();

        assert_eq!(job.previous, GenerationStatus::Idle);
        assert_eq!(scene_image(&coord).0, GenerationStatus::Generating);
        assert!(!coord.lock_state().history().can_undo());
    }

    #[test]
    fn test_finish_commits_and_undo_returns_to_idle() {
        let coord = coordinator(Ok("img".into()));
        let job = coord.begin_scene_image("s1").unwrap();

        assert!(coord.finish_scene_image(&job, Ok("data:image/png;base64,x".into())));
        assert_eq!(
            scene_image(&coord),
            (GenerationStatus::Completed, Some("data:image/png;base64,x".into()))
        );

        assert!(coord.lock_state().undo());
        assert_eq!(scene_image(&coord), (GenerationStatus::Idle, None));
    }

    #[test]
    fn test_superseded_result_is_dropped() {
        let coord = coordinator(Ok("img".into()));
        let first = coord.begin_scene_image("s1").unwrap();
        let second = coord.begin_scene_image("s1").unwrap();

        assert!(coord.finish_scene_image(&second, Ok("new".into())));
        assert!(!coord.finish_scene_image(&first, Ok("old".into())));
        assert_eq!(scene_image(&coord).1, Some("new".into()));
    }

    #[test]
    fn test_result_dropped_when_scene_no_longer_generating() {
        let coord = coordinator(Ok("img".into()));
        let job = coord.begin_scene_image("s1").unwrap();

        coord
            .lock_state()
            .update_untracked(|p| p.scenes[0].image.status = GenerationStatus::Idle);

        assert!(!coord.finish_scene_image(&job, Ok("late".into())));
        assert_eq!(scene_image(&coord), (GenerationStatus::Idle, None));
    }

    #[test]
    fn test_failure_sets_error_and_notifies() {
        let (producer, mut consumer) = create_notification_channel(8);
        let state = EditorState::new(project()).with_notifications(Arc::new(Mutex::new(producer)));
        let service = FixedService {
            image: Ok(String::new()),
            story_chunks: Vec::new(),
        };
        let coord = GenerationCoordinator::new(Arc::new(service), Arc::new(Mutex::new(state)));

        let job = coord.begin_scene_image("s1").unwrap();
        assert!(!coord.finish_scene_image(&job, Err(GenerationError::Service("boom".into()))));
        assert_eq!(scene_image(&coord).0, GenerationStatus::Error);

        let notification = consumer.try_pop().unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert_eq!(notification.category, NotificationCategory::Image);
    }

    #[test]
    fn test_unauthorized_downgrades_session() {
        let coord = coordinator(Ok("img".into()));
        let job = coord.begin_scene_image("s1").unwrap();

        let err = GenerationError::from_service_message("Requested entity was not found.");
        assert!(!coord.finish_scene_image(&job, Err(err)));
        assert_eq!(scene_image(&coord).0, GenerationStatus::Idle);
        assert!(!coord.lock_state().is_configured());

        // Refused until credentials are selected again
        assert!(coord.begin_scene_image("s1").is_none());
        coord.lock_state().reconfigure();
        assert!(coord.begin_scene_image("s1").is_some());
    }

    #[test]
    fn test_missing_entity_is_refused() {
        let coord = coordinator(Ok("img".into()));
        assert!(coord.begin_scene_image("nope").is_none());
        assert!(coord.begin_character_avatar("nope").is_none());
    }

    #[test]
    fn test_audio_requires_voiceover() {
        let coord = coordinator(Ok("img".into()));
        coord
            .lock_state()
            .update_untracked(|p| p.scenes[0].voiceover.clear());
        assert!(coord.begin_scene_audio("s1").is_none());
        assert_eq!(
            coord.lock_state().project().scenes[0].audio_status(),
            GenerationStatus::Idle
        );
    }

    #[tokio::test]
    async fn test_generate_audio_and_avatar() {
        let coord = coordinator(Ok("img".into()));

        assert!(coord.generate_scene_audio("s1").await);
        assert!(coord.generate_character_avatar("c1").await);

        let state = coord.lock_state();
        let audio = state.project().scenes[0].audio.clone().unwrap();
        assert_eq!(audio.status, GenerationStatus::Completed);
        assert_eq!(audio.data.as_deref(), Some("AAAA"));
        let character = state.project().character("c1").unwrap();
        assert_eq!(character.status, GenerationStatus::Completed);
        assert!(character.reference_image.is_some());
    }

    #[tokio::test]
    async fn test_generate_story_streams_then_commits() {
        let body = r#"{"synopsis":"S","beats":["b"],"scenes":[{"title":"One"},{"title":"Two"}]}"#;
        let (head, tail) = body.split_at(20);
        let service = FixedService {
            image: Ok("img".into()),
            story_chunks: vec![head.to_string(), tail.to_string()],
        };
        let state = Arc::new(Mutex::new(EditorState::new(project())));
        let coord = GenerationCoordinator::new(Arc::new(service), state);

        assert!(coord.generate_story().await);

        let state = coord.lock_state();
        assert!(!state.is_streaming());
        assert_eq!(state.project().story.synopsis, "S");
        let orders: Vec<usize> = state.project().scenes.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert!(state.history().can_undo());
    }
}
