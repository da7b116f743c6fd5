// Generation - Story, image, narration and portrait requests

pub mod coordinator;
pub mod prompt;
pub mod service;
pub mod stream;
pub mod tracker;

pub use coordinator::{GenerationCoordinator, GenerationJob};
pub use service::{
    GenerationError, GenerationService, ImageRequest, PortraitRequest, SpeechRequest,
    StoryRequest, TextStream,
};
pub use stream::{GeneratedScene, StoryDocument, StoryStream, parse_story};
pub use tracker::{EntityKey, RequestTicket, RequestTracker};
