// Manual version archive: named copies of story + scenes

use crate::project::ProjectError;
use crate::project::types::*;
use chrono::Utc;

/// Archive the current story and scenes under `label`, returning the new version id
pub fn archive_version(project: &mut ProjectSnapshot, label: impl Into<String>) -> String {
    let label = label.into();
    let label = if label.trim().is_empty() {
        format!("Version {}", project.versions.len() + 1)
    } else {
        label
    };

    let version = Version {
        id: crate::project::generate_entity_id(),
        label,
        timestamp: Utc::now(),
        snapshot: VersionSnapshot {
            story: project.story.clone(),
            scenes: project.scenes.clone(),
        },
    };
    let id = version.id.clone();
    project.versions.push(version);
    id
}

/// Replace story and scenes with the archived copy
pub fn restore_version(project: &mut ProjectSnapshot, version_id: &str) -> Result<(), ProjectError> {
    let version = project
        .versions
        .iter()
        .find(|v| v.id == version_id)
        .ok_or_else(|| ProjectError::VersionNotFound(version_id.to_string()))?;

    let VersionSnapshot { story, scenes } = version.snapshot.clone();
    project.story = story;
    project.scenes = scenes;
    crate::project::normalize_scene_order(&mut project.scenes);
    Ok(())
}

pub fn delete_version(project: &mut ProjectSnapshot, version_id: &str) -> Result<(), ProjectError> {
    let before = project.versions.len();
    project.versions.retain(|v| v.id != version_id);
    if project.versions.len() == before {
        return Err(ProjectError::VersionNotFound(version_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_story() -> ProjectSnapshot {
        let mut project = ProjectSnapshot::default();
        project.story.synopsis = "First draft".to_string();
        project.scenes.push(Scene::new(0, "Opening"));
        project
    }

    #[test]
    fn test_archive_and_restore() {
        let mut project = project_with_story();
        let id = archive_version(&mut project, "Draft 1");

        project.story.synopsis = "Rewrite".to_string();
        project.scenes.clear();

        restore_version(&mut project, &id).unwrap();
        assert_eq!(project.story.synopsis, "First draft");
        assert_eq!(project.scenes.len(), 1);
        assert_eq!(project.versions.len(), 1);
        assert_eq!(project.versions[0].label, "Draft 1");
    }

    #[test]
    fn test_blank_label_gets_numbered() {
        let mut project = project_with_story();
        archive_version(&mut project, "A");
        archive_version(&mut project, "  ");
        assert_eq!(project.versions[1].label, "Version 2");
    }

    #[test]
    fn test_archived_copy_is_independent() {
        let mut project = project_with_story();
        archive_version(&mut project, "Draft");
        project.scenes[0].title = "Changed".to_string();
        assert_eq!(project.versions[0].snapshot.scenes[0].title, "Opening");
    }

    #[test]
    fn test_unknown_version() {
        let mut project = project_with_story();
        assert!(matches!(
            restore_version(&mut project, "missing"),
            Err(ProjectError::VersionNotFound(_))
        ));
        assert!(delete_version(&mut project, "missing").is_err());

        let id = archive_version(&mut project, "Draft");
        delete_version(&mut project, &id).unwrap();
        assert!(project.versions.is_empty());
    }
}
