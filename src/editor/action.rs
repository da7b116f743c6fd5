// Concrete edit actions
//
// Each action is a mutator over one `ProjectSnapshot`. The editor applies it
// to a copy of the current snapshot and commits the copy, so an action never
// touches a snapshot that is already in the history.

use crate::project::types::*;
use crate::project::{self, versions};

/// Result type for edit operations
pub type EditResult<T> = Result<T, EditError>;

/// Reasons an edit can be rejected before anything is committed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    #[error("Character not found: {0}")]
    CharacterNotFound(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Index {index} out of bounds for {length} scenes")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("Invalid edit: {0}")]
    Invalid(String),
}

/// Every user edit that produces a new history entry
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    SetTitle(String),
    UpdateIdea(Idea),
    AddCharacter(Character),
    /// Replaces the character with the same id
    UpdateCharacter(Character),
    RemoveCharacter { id: String },
    /// Appends at the end of the storyboard
    AddScene(Scene),
    /// Replaces the scene with the same id, keeping its position
    UpdateScene(Scene),
    RemoveScene { id: String },
    ReorderScenes { from: usize, to: usize },
    /// Replace story and scenes with a freshly generated result
    ApplyStory { story: Story, scenes: Vec<Scene> },
    ArchiveVersion { label: String },
    RestoreVersion { id: String },
    DeleteVersion { id: String },
}

impl EditAction {
    /// Apply the edit to `project`
    ///
    /// On error `project` may be partially modified; callers apply to a copy.
    pub fn apply(&self, project: &mut ProjectSnapshot) -> EditResult<()> {
        match self {
            EditAction::SetTitle(title) => {
                if title.trim().is_empty() {
                    return Err(EditError::Invalid("Title cannot be empty".into()));
                }
                project.title = title.clone();
            }

            EditAction::UpdateIdea(idea) => {
                if idea.duration == 0 {
                    return Err(EditError::Invalid(
                        "Target duration must be at least one second".into(),
                    ));
                }
                project.idea = idea.clone();
            }

            EditAction::AddCharacter(character) => {
                if project.character(&character.id).is_some() {
                    return Err(EditError::Invalid(format!(
                        "Character {} already exists",
                        character.id
                    )));
                }
                project.characters.push(character.clone());
            }

            EditAction::UpdateCharacter(character) => {
                let slot = project
                    .character_mut(&character.id)
                    .ok_or_else(|| EditError::CharacterNotFound(character.id.clone()))?;
                *slot = character.clone();
            }

            EditAction::RemoveCharacter { id } => {
                let before = project.characters.len();
                project.characters.retain(|c| &c.id != id);
                if project.characters.len() == before {
                    return Err(EditError::CharacterNotFound(id.clone()));
                }
            }

            EditAction::AddScene(scene) => {
                if project.scene(&scene.id).is_some() {
                    return Err(EditError::Invalid(format!("Scene {} already exists", scene.id)));
                }
                let mut scene = scene.clone();
                scene.order = project.scenes.len();
                project.scenes.push(scene);
            }

            EditAction::UpdateScene(scene) => {
                let position = project
                    .scene_position(&scene.id)
                    .ok_or_else(|| EditError::SceneNotFound(scene.id.clone()))?;
                let mut scene = scene.clone();
                scene.order = position;
                project.scenes[position] = scene;
            }

            EditAction::RemoveScene { id } => {
                let position = project
                    .scene_position(id)
                    .ok_or_else(|| EditError::SceneNotFound(id.clone()))?;
                project.scenes.remove(position);
                project::normalize_scene_order(&mut project.scenes);
            }

            EditAction::ReorderScenes { from, to } => {
                let length = project.scenes.len();
                for index in [*from, *to] {
                    if index >= length {
                        return Err(EditError::IndexOutOfBounds { index, length });
                    }
                }
                project::reorder_scenes(&mut project.scenes, *from, *to);
            }

            EditAction::ApplyStory { story, scenes } => {
                project.story = story.clone();
                project.scenes = scenes.clone();
                for (index, scene) in project.scenes.iter_mut().enumerate() {
                    scene.order = index;
                }
            }

            EditAction::ArchiveVersion { label } => {
                versions::archive_version(project, label.clone());
            }

            EditAction::RestoreVersion { id } => {
                versions::restore_version(project, id)
                    .map_err(|_| EditError::VersionNotFound(id.clone()))?;
            }

            EditAction::DeleteVersion { id } => {
                versions::delete_version(project, id)
                    .map_err(|_| EditError::VersionNotFound(id.clone()))?;
            }
        }

        Ok(())
    }

    /// Human-readable description for undo/redo labels
    pub fn description(&self) -> String {
        match self {
            EditAction::SetTitle(title) => format!("Rename to \"{}\"", title),
            EditAction::UpdateIdea(idea) => format!("Update idea ({})", idea.theme),
            EditAction::AddCharacter(c) => format!("Add character {}", c.name),
            EditAction::UpdateCharacter(c) => format!("Edit character {}", c.name),
            EditAction::RemoveCharacter { .. } => "Remove character".to_string(),
            EditAction::AddScene(s) => format!("Add scene {}", s.title),
            EditAction::UpdateScene(s) => format!("Edit scene {}", s.title),
            EditAction::RemoveScene { .. } => "Remove scene".to_string(),
            EditAction::ReorderScenes { from, to } => {
                format!("Move scene {} to {}", from + 1, to + 1)
            }
            EditAction::ApplyStory { scenes, .. } => {
                format!("Generate story ({} scenes)", scenes.len())
            }
            EditAction::ArchiveVersion { label } => format!("Save version {}", label),
            EditAction::RestoreVersion { .. } => "Restore version".to_string(),
            EditAction::DeleteVersion { .. } => "Delete version".to_string(),
        }
    }
}
