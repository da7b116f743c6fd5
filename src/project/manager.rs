// Project manager for creating, saving and loading storyboards

use crate::project::serialization::{deserialize_record, serialize_record};
use crate::project::store::KeyValueStore;
use crate::project::types::*;
use log::{debug, info, warn};

/// Key the current document is stored under
pub const PROJECT_STORAGE_KEY: &str = "storyboard-studio.project";

/// Project error types
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("File system error: {0}")]
    FileSystemError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid project structure: {0}")]
    InvalidStructure(String),

    #[error("Project validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for loading a project
#[derive(Debug, Clone)]
pub struct ProjectLoadOptions {
    /// Whether to validate the project structure after normalizing it
    pub validate: bool,
    /// Renumber scene order fields so they are contiguous again
    pub normalize_order: bool,
}

impl Default for ProjectLoadOptions {
    fn default() -> Self {
        Self {
            validate: true,
            normalize_order: true,
        }
    }
}

/// Project manager - handles creating, saving and loading documents
#[derive(Debug, Clone)]
pub struct ProjectManager {
    storage_key: String,
    /// Idea new projects start from
    default_idea: Idea,
}

impl ProjectManager {
    pub fn new() -> Self {
        Self::with_storage_key(PROJECT_STORAGE_KEY)
    }

    pub fn with_storage_key(key: impl Into<String>) -> Self {
        Self {
            storage_key: key.into(),
            default_idea: Idea::default(),
        }
    }

    /// Builder: narration voice and other brief defaults for new projects
    pub fn with_default_idea(mut self, idea: Idea) -> Self {
        self.default_idea = idea;
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Create a new empty project
    pub fn create_new_project(&self, title: String) -> ProjectSnapshot {
        ProjectSnapshot {
            title,
            idea: self.default_idea.clone(),
            ..Default::default()
        }
    }

    /// Save the document record to the store
    pub fn save_project(
        &self,
        store: &mut dyn KeyValueStore,
        project: &ProjectSnapshot,
    ) -> Result<(), ProjectError> {
        let record = serialize_record(project)?;
        store.set(&self.storage_key, &record)?;

        debug!(
            "Saved project {} ({} scenes, {} bytes)",
            project.id,
            project.scenes.len(),
            record.len()
        );
        Ok(())
    }

    /// Load the document record from the store
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    pub fn load_project(
        &self,
        store: &dyn KeyValueStore,
        options: &ProjectLoadOptions,
    ) -> Result<Option<ProjectSnapshot>, ProjectError> {
        let Some(record) = store.get(&self.storage_key)? else {
            info!("No saved project under {}", self.storage_key);
            return Ok(None);
        };

        let mut project = deserialize_record(&record)?;

        if options.normalize_order {
            let contiguous = project
                .scenes
                .iter()
                .enumerate()
                .all(|(i, s)| s.order == i);
            if !contiguous {
                warn!("Scene order of project {} was not contiguous, renumbering", project.id);
                crate::project::normalize_scene_order(&mut project.scenes);
            }
        }

        if options.validate {
            crate::project::validate_project_structure(&project)
                .map_err(|e| ProjectError::ValidationFailed(e.to_string()))?;
        }

        info!("Loaded project {} \"{}\"", project.id, project.title);
        Ok(Some(project))
    }

    /// Load the saved document or create a fresh one
    pub fn load_or_create(
        &self,
        store: &dyn KeyValueStore,
        options: &ProjectLoadOptions,
    ) -> Result<ProjectSnapshot, ProjectError> {
        match self.load_project(store, options)? {
            Some(project) => Ok(project),
            None => Ok(self.create_new_project("Untitled Storyboard".to_string())),
        }
    }

    /// Forget the saved document
    pub fn clear(&self, store: &mut dyn KeyValueStore) -> Result<(), ProjectError> {
        store.remove(&self.storage_key)
    }
}

impl Default for ProjectManager {
    fn default() -> Self {
        Self::new()
    }
}
