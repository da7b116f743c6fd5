// Storyboard document model and its persistence
//
// The document is saved as one JSON record in a key-value store; exports
// (full JSON, scene CSV) live in `serialization`.

pub mod autosave;
pub mod manager;
pub mod serialization;
pub mod store;
pub mod types;
pub mod versions;

pub use autosave::{AutosaveScheduler, Autosaver};
pub use manager::{PROJECT_STORAGE_KEY, ProjectError, ProjectLoadOptions, ProjectManager};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::{
    AspectRatio, Character, GenerationStatus, Idea, Platform, ProjectSnapshot, Scene, SceneAudio,
    SceneImage, ScenePrompt, Story, Version, VersionSnapshot,
};

use std::collections::HashSet;

/// Generate a fresh id for a project, scene, character or version
pub fn generate_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Sort scenes by their `order` field and renumber them 0..N-1
///
/// Stable, so scenes sharing an order keep their list position.
pub fn normalize_scene_order(scenes: &mut [Scene]) {
    scenes.sort_by_key(|s| s.order);
    for (index, scene) in scenes.iter_mut().enumerate() {
        scene.order = index;
    }
}

/// Move the scene at `from` to position `to` and renumber
///
/// Out-of-range indices leave the list untouched. Returns whether anything moved.
pub fn reorder_scenes(scenes: &mut Vec<Scene>, from: usize, to: usize) -> bool {
    if from >= scenes.len() || to >= scenes.len() {
        return false;
    }

    if from != to {
        let scene = scenes.remove(from);
        scenes.insert(to, scene);
    }

    for (index, scene) in scenes.iter_mut().enumerate() {
        scene.order = index;
    }

    from != to
}

/// Check the invariants every stored or committed document must hold
pub fn validate_project_structure(project: &ProjectSnapshot) -> Result<(), ProjectError> {
    if project.title.trim().is_empty() {
        return Err(ProjectError::InvalidStructure(
            "Project title cannot be empty".to_string(),
        ));
    }

    if project.idea.duration == 0 {
        return Err(ProjectError::InvalidStructure(
            "Target duration must be at least one second".to_string(),
        ));
    }

    let mut character_ids = HashSet::new();
    for character in &project.characters {
        if !character_ids.insert(character.id.as_str()) {
            return Err(ProjectError::InvalidStructure(format!(
                "Duplicate character ID: {}",
                character.id
            )));
        }
    }

    let mut scene_ids = HashSet::new();
    for (position, scene) in project.scenes.iter().enumerate() {
        if !scene_ids.insert(scene.id.as_str()) {
            return Err(ProjectError::InvalidStructure(format!(
                "Duplicate scene ID: {}",
                scene.id
            )));
        }

        if scene.order != position {
            return Err(ProjectError::InvalidStructure(format!(
                "Scene {} has order {} but sits at position {}",
                scene.id, scene.order, position
            )));
        }

        if !scene.duration.is_finite() || scene.duration < 0.0 {
            return Err(ProjectError::InvalidStructure(format!(
                "Scene {} duration must be a non-negative number",
                scene.id
            )));
        }
    }

    Ok(())
}
