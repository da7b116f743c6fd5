// Storyboard Studio - Library exports for the CLI, tests and benchmarks

pub mod audio;
pub mod config;
pub mod editor;
pub mod generation;
pub mod history;
pub mod messaging;
pub mod project;

// Re-export commonly used types for convenience
pub use audio::{AudioError, NarrationExporter, WavHeader, decode_wav, encode_wav};
pub use config::{ConfigError, StudioConfig};
pub use editor::{EditAction, EditError, EditorState, SessionStatus};
pub use generation::{
    EntityKey, GenerationCoordinator, GenerationError, GenerationService, RequestTracker,
    StoryStream,
};
pub use history::{DEFAULT_MAX_HISTORY, History};
pub use messaging::channels::{create_editor_channel, create_notification_channel};
pub use messaging::{EditorMessage, Notification, NotificationCategory, NotificationLevel};
pub use project::{
    AutosaveScheduler, Autosaver, FileStore, KeyValueStore, MemoryStore, ProjectError, ProjectLoadOptions,
    ProjectManager, ProjectSnapshot, Scene,
};
