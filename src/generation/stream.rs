// Story stream accumulation and final parsing
//
// The model streams one JSON document in arbitrary text chunks. Until the
// stream ends the buffer is usually not valid JSON; that is expected and
// never reported as an error.

use crate::generation::service::GenerationError;
use crate::project::types::{Scene, ScenePrompt, Story};
use serde::Deserialize;

/// Scene as described by the model, before it gets an id and status
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedScene {
    pub title: String,
    pub duration: f32,
    pub shot_type: String,
    pub setting: String,
    pub action: String,
    pub characters: Vec<String>,
    #[serde(alias = "narration", alias = "voiceOver")]
    pub voiceover: String,
    #[serde(alias = "visualPrompt", alias = "imagePrompt")]
    pub prompt: String,
    pub negative_prompt: String,
    pub style_preset: String,
}

impl GeneratedScene {
    /// Turn into a storyboard scene at `order` with idle generation state
    pub fn into_scene(self, order: usize) -> Scene {
        let mut scene = Scene::new(order, self.title);
        if self.duration.is_finite() && self.duration > 0.0 {
            scene.duration = self.duration;
        }
        scene.shot_type = self.shot_type;
        scene.setting = self.setting;
        scene.action = self.action;
        scene.characters = self.characters;
        scene.voiceover = self.voiceover;
        scene.prompt = ScenePrompt {
            positive: self.prompt,
            negative: self.negative_prompt,
            style_preset: self.style_preset,
        };
        scene
    }
}

/// Complete story result
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryDocument {
    pub synopsis: String,
    pub beats: Vec<String>,
    pub scenes: Vec<GeneratedScene>,
}

impl StoryDocument {
    pub fn story(&self) -> Story {
        Story {
            synopsis: self.synopsis.clone(),
            beats: self.beats.clone(),
        }
    }

    pub fn into_scenes(self) -> Vec<Scene> {
        self.scenes
            .into_iter()
            .enumerate()
            .map(|(order, scene)| scene.into_scene(order))
            .collect()
    }
}

/// Cut the JSON object out of model text (which may be wrapped in a code fence)
fn json_body(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a complete story text
pub fn parse_story(text: &str) -> Result<StoryDocument, GenerationError> {
    let body = json_body(text)
        .ok_or_else(|| GenerationError::InvalidStory("no JSON object in response".to_string()))?;

    let document: StoryDocument =
        serde_json::from_str(body).map_err(|e| GenerationError::InvalidStory(e.to_string()))?;

    if document.synopsis.trim().is_empty() && document.scenes.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(document)
}

/// Growing buffer of streamed story text
#[derive(Debug, Clone, Default)]
pub struct StoryStream {
    buffer: String,
    chunks: usize,
}

impl StoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
        self.chunks += 1;
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Best-effort parse of what has arrived so far; `None` while incomplete
    pub fn parse_partial(&self) -> Option<StoryDocument> {
        parse_story(&self.buffer).ok()
    }

    /// Parse the accumulated text once the stream has ended
    pub fn finish(self) -> Result<StoryDocument, GenerationError> {
        parse_story(&self.buffer)
    }
}
