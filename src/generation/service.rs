// Interface to the generative AI backend
//
// The crate never talks to a provider directly; an implementation of
// `GenerationService` is handed to the coordinator.

use crate::project::types::{AspectRatio, Character, Idea};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Incremental story text as it arrives from the model
pub type TextStream = BoxStream<'static, Result<String, GenerationError>>;

/// Error messages that mean the credentials themselves were rejected
const AUTH_FAILURE_SIGNATURES: [&str; 5] = [
    "requested entity was not found",
    "api key not valid",
    "permission denied",
    "permission_denied",
    "unauthenticated",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// Credentials or entitlement rejected; the whole session needs reconfiguring
    #[error("Credentials rejected: {0}")]
    Unauthorized(String),

    #[error("Generation returned no usable payload")]
    EmptyResponse,

    #[error("Generation failed: {0}")]
    Service(String),

    #[error("Story could not be parsed: {0}")]
    InvalidStory(String),
}

impl GenerationError {
    /// Classify a raw provider error message
    pub fn from_service_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if AUTH_FAILURE_SIGNATURES.iter().any(|sig| lowered.contains(sig)) {
            GenerationError::Unauthorized(message)
        } else {
            GenerationError::Service(message)
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, GenerationError::Unauthorized(_))
    }
}

/// Brief for story generation
#[derive(Debug, Clone, PartialEq)]
pub struct StoryRequest {
    pub idea: Idea,
    pub characters: Vec<Character>,
}

/// Render one scene frame
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub seed: Option<u64>,
    /// Encoded reference images keeping characters consistent
    pub reference_images: Vec<String>,
}

/// Synthesize narration
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
}

/// Render a character portrait
#[derive(Debug, Clone, PartialEq)]
pub struct PortraitRequest {
    pub description: String,
    pub seed: Option<u64>,
}

/// The four request shapes the storyboard needs from the AI provider
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Stream a structured story document as text chunks
    async fn stream_story(&self, request: StoryRequest) -> Result<TextStream, GenerationError>;

    /// Render a scene image, returning one encoded image (data URL or URL)
    async fn render_image(&self, request: ImageRequest) -> Result<String, GenerationError>;

    /// Synthesize speech, returning raw 16-bit PCM encoded as base64
    async fn synthesize_speech(&self, request: SpeechRequest) -> Result<String, GenerationError>;

    /// Render a character portrait, returning one encoded image
    async fn render_portrait(&self, request: PortraitRequest) -> Result<String, GenerationError>;
}
