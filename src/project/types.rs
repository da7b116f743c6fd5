// Types for the authored storyboard document
//
// Everything here is plain data: a `ProjectSnapshot` owns its characters,
// story, scenes and archived versions outright, so cloning one produces a
// fully independent document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a single generated asset (scene image, scene audio, avatar)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    #[default]
    Idle,
    Generating,
    Completed,
    Error,
}

impl GenerationStatus {
    pub fn is_generating(&self) -> bool {
        matches!(self, GenerationStatus::Generating)
    }
}

/// Target aspect ratio for rendered frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publishing platform the storyboard is authored for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Platform {
    #[default]
    #[serde(rename = "tiktok")]
    TikTok,
    #[serde(rename = "reels")]
    InstagramReels,
    #[serde(rename = "shorts")]
    YoutubeShorts,
    #[serde(rename = "youtube")]
    Youtube,
    #[serde(rename = "presentation")]
    Presentation,
}

impl Platform {
    /// Vertical short-form platforms render portrait frames
    pub fn aspect_ratio(&self) -> AspectRatio {
        match self {
            Platform::TikTok | Platform::InstagramReels | Platform::YoutubeShorts => {
                AspectRatio::Portrait
            }
            Platform::Youtube | Platform::Presentation => AspectRatio::Landscape,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::InstagramReels => "reels",
            Platform::YoutubeShorts => "shorts",
            Platform::Youtube => "youtube",
            Platform::Presentation => "presentation",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tiktok" => Ok(Platform::TikTok),
            "reels" | "instagram" => Ok(Platform::InstagramReels),
            "shorts" => Ok(Platform::YoutubeShorts),
            "youtube" => Ok(Platform::Youtube),
            "presentation" => Ok(Platform::Presentation),
            other => Err(format!("Unknown platform: {}", other)),
        }
    }
}

/// Creative brief the story is generated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Idea {
    pub theme: String,
    pub genre: String,
    /// Target running time in seconds
    pub duration: u32,
    pub platform: Platform,
    pub style: String,
    pub mood: String,
    pub call_to_action: String,
    pub language: String,
    /// Narration voice identifier
    pub voice: String,
    pub seed: Option<u64>,
}

impl Default for Idea {
    fn default() -> Self {
        Self {
            theme: String::new(),
            genre: "Drama".to_string(),
            duration: 30,
            platform: Platform::default(),
            style: "Cinematic".to_string(),
            mood: "Uplifting".to_string(),
            call_to_action: String::new(),
            language: "English".to_string(),
            voice: "Kore".to_string(),
            seed: None,
        }
    }
}

/// A recurring character in the storyboard
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub role: String,
    pub description: String,
    /// Style constraints that must hold in every frame the character appears in
    pub consistency_rules: Vec<String>,
    /// Encoded reference image (data URL or opaque blob reference)
    pub reference_image: Option<String>,
    /// Replaces the generated portrait prompt when set
    pub avatar_prompt: Option<String>,
    pub status: GenerationStatus,
}

impl Character {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: crate::project::generate_entity_id(),
            name: name.into(),
            role: role.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.consistency_rules.push(rule.into());
        self
    }

    pub fn with_reference_image(mut self, image: impl Into<String>) -> Self {
        self.reference_image = Some(image.into());
        self
    }
}

/// Synopsis plus ordered story beats
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Story {
    pub synopsis: String,
    pub beats: Vec<String>,
}

impl Story {
    pub fn is_empty(&self) -> bool {
        self.synopsis.is_empty() && self.beats.is_empty()
    }
}

/// Text prompt used to render a scene
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenePrompt {
    pub positive: String,
    pub negative: String,
    pub style_preset: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneImage {
    pub status: GenerationStatus,
    pub url: Option<String>,
}

/// Narration state; `data` holds base64 encoded raw PCM (16-bit LE mono)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneAudio {
    pub status: GenerationStatus,
    pub data: Option<String>,
}

impl SceneAudio {
    pub fn has_payload(&self) -> bool {
        self.data.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// One storyboard panel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scene {
    pub id: String,
    /// Position in the storyboard, contiguous 0..N-1
    pub order: usize,
    pub title: String,
    /// Seconds
    pub duration: f32,
    pub shot_type: String,
    pub setting: String,
    pub action: String,
    /// Names of the characters appearing in the scene
    pub characters: Vec<String>,
    pub voiceover: String,
    pub prompt: ScenePrompt,
    pub image: SceneImage,
    pub audio: Option<SceneAudio>,
    pub use_same_character: bool,
}

impl Scene {
    pub fn new(order: usize, title: impl Into<String>) -> Self {
        Self {
            id: crate::project::generate_entity_id(),
            order,
            title: title.into(),
            duration: 3.0,
            use_same_character: true,
            ..Default::default()
        }
    }

    pub fn audio_status(&self) -> GenerationStatus {
        self.audio.as_ref().map(|a| a.status).unwrap_or_default()
    }
}

/// The part of a document captured by a manual version
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionSnapshot {
    pub story: Story,
    pub scenes: Vec<Scene>,
}

/// Manually archived story + scenes, independent of undo/redo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub snapshot: VersionSnapshot,
}

/// The whole authored document at one point in time
///
/// This is also the exact shape of the persisted record: transient editor
/// fields (history, cursor, streaming buffer) live on `EditorState` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSnapshot {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub idea: Idea,
    pub characters: Vec<Character>,
    pub story: Story,
    pub scenes: Vec<Scene>,
    pub versions: Vec<Version>,
}

impl Default for ProjectSnapshot {
    fn default() -> Self {
        let now = Utc::now();

        Self {
            id: crate::project::generate_entity_id(),
            title: "Untitled Storyboard".to_string(),
            created_at: now,
            updated_at: now,
            idea: Idea::default(),
            characters: Vec::new(),
            story: Story::default(),
            scenes: Vec::new(),
            versions: Vec::new(),
        }
    }
}

impl ProjectSnapshot {
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.idea.platform.aspect_ratio()
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn scene_mut(&mut self, id: &str) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.id == id)
    }

    /// Position of a scene in the ordered list
    pub fn scene_position(&self, id: &str) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn character_mut(&mut self, id: &str) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    /// Characters referenced by name from a scene, in roster order
    pub fn characters_in_scene<'a>(&'a self, scene: &'a Scene) -> impl Iterator<Item = &'a Character> {
        self.characters
            .iter()
            .filter(move |c| scene.characters.iter().any(|name| name == &c.name))
    }

    pub fn total_duration(&self) -> f32 {
        self.scenes.iter().map(|s| s.duration).sum()
    }
}
