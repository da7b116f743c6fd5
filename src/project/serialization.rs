// Serialization utilities for persistence and export

use crate::project::ProjectError;
use crate::project::types::*;

/// Column headers of the scene CSV export
pub const SCENE_CSV_HEADERS: [&str; 11] = [
    "Order",
    "Title",
    "Duration",
    "Shot Type",
    "Setting",
    "Action",
    "Characters",
    "Voiceover",
    "Prompt",
    "Negative Prompt",
    "Style",
];

/// Serialize the persisted record (compact JSON)
pub fn serialize_record(project: &ProjectSnapshot) -> Result<String, ProjectError> {
    serde_json::to_string(project).map_err(|e| {
        ProjectError::SerializationError(format!("Failed to serialize project record: {}", e))
    })
}

/// Deserialize the persisted record; missing fields fall back to defaults
pub fn deserialize_record(data: &str) -> Result<ProjectSnapshot, ProjectError> {
    serde_json::from_str(data).map_err(|e| {
        ProjectError::SerializationError(format!("Failed to deserialize project record: {}", e))
    })
}

/// Full document as pretty-printed JSON, for file export
pub fn export_json(project: &ProjectSnapshot) -> Result<String, ProjectError> {
    serde_json::to_string_pretty(project).map_err(|e| {
        ProjectError::SerializationError(format!("Failed to export project to JSON: {}", e))
    })
}

/// Quote a CSV field, doubling embedded quotes
pub fn csv_escape(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Scene list as CSV, one row per scene in storyboard order
pub fn export_scenes_csv(scenes: &[Scene]) -> String {
    let mut out = SCENE_CSV_HEADERS
        .iter()
        .map(|h| csv_escape(h))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for (position, scene) in scenes.iter().enumerate() {
        let row = [
            (position + 1).to_string(),
            scene.title.clone(),
            format!("{}", scene.duration),
            scene.shot_type.clone(),
            scene.setting.clone(),
            scene.action.clone(),
            scene.characters.join("; "),
            scene.voiceover.clone(),
            scene.prompt.positive.clone(),
            scene.prompt.negative.clone(),
            scene.prompt.style_preset.clone(),
        ];

        out.push_str(
            &row.iter()
                .map(|field| csv_escape(field))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push('\n');
    }

    out
}

/// File name used for exports, derived from the project title
pub fn export_file_stem(project: &ProjectSnapshot) -> String {
    let stem: String = project
        .title
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');

    if stem.is_empty() {
        "storyboard".to_string()
    } else {
        stem.to_string()
    }
}
