// Request construction from the current document

use crate::generation::service::{ImageRequest, PortraitRequest, SpeechRequest, StoryRequest};
use crate::project::types::{Character, ProjectSnapshot, Scene};

pub fn story_request(project: &ProjectSnapshot) -> StoryRequest {
    StoryRequest {
        idea: project.idea.clone(),
        characters: project.characters.clone(),
    }
}

/// Instruction text for the story model
pub fn story_prompt(request: &StoryRequest) -> String {
    let idea = &request.idea;
    let mut prompt = format!(
        "Write a {genre} storyboard about \"{theme}\" for {platform} ({ratio}), \
         about {duration} seconds long, in {language}. Visual style: {style}. Mood: {mood}.",
        genre = idea.genre,
        theme = idea.theme,
        platform = idea.platform,
        ratio = idea.platform.aspect_ratio(),
        duration = idea.duration,
        language = idea.language,
        style = idea.style,
        mood = idea.mood,
    );

    if !idea.call_to_action.trim().is_empty() {
        prompt.push_str(&format!(" End with the call to action: \"{}\".", idea.call_to_action));
    }

    if !request.characters.is_empty() {
        prompt.push_str("\nCharacters:");
        for character in &request.characters {
            prompt.push_str(&format!(
                "\n- {} ({}): {}",
                character.name, character.role, character.description
            ));
        }
    }

    prompt.push_str(
        "\nRespond with one JSON object: {\"synopsis\", \"beats\": [string], \"scenes\": \
         [{\"title\", \"duration\", \"shotType\", \"setting\", \"action\", \"characters\", \
         \"voiceover\", \"prompt\", \"negativePrompt\", \"stylePreset\"}]}.",
    );
    prompt
}

/// Image prompt for a scene: visual prompt, style, then per-character rules
pub fn image_request(project: &ProjectSnapshot, scene: &Scene) -> ImageRequest {
    let mut parts: Vec<String> = Vec::new();

    let positive = scene.prompt.positive.trim();
    if positive.is_empty() {
        parts.push(scene.action.trim().to_string());
    } else {
        parts.push(positive.to_string());
    }
    if !scene.setting.trim().is_empty() {
        parts.push(format!("Setting: {}", scene.setting.trim()));
    }
    if !scene.shot_type.trim().is_empty() {
        parts.push(format!("{} shot", scene.shot_type.trim()));
    }

    let style = if scene.prompt.style_preset.trim().is_empty() {
        project.idea.style.trim()
    } else {
        scene.prompt.style_preset.trim()
    };
    if !style.is_empty() {
        parts.push(format!("Style: {}", style));
    }
    if !project.idea.mood.trim().is_empty() {
        parts.push(format!("Mood: {}", project.idea.mood.trim()));
    }

    for character in project.characters_in_scene(scene) {
        if !character.consistency_rules.is_empty() {
            parts.push(format!(
                "{}: {}",
                character.name,
                character.consistency_rules.join(", ")
            ));
        }
    }

    if !scene.prompt.negative.trim().is_empty() {
        parts.push(format!("Avoid: {}", scene.prompt.negative.trim()));
    }

    let reference_images = if scene.use_same_character {
        project
            .characters_in_scene(scene)
            .filter_map(|c| c.reference_image.clone())
            .collect()
    } else {
        Vec::new()
    };

    ImageRequest {
        prompt: parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(". "),
        aspect_ratio: project.aspect_ratio(),
        seed: project.idea.seed,
        reference_images,
    }
}

/// Narration request; `None` when the scene has no voiceover text
pub fn speech_request(project: &ProjectSnapshot, scene: &Scene) -> Option<SpeechRequest> {
    let text = scene.voiceover.trim();
    if text.is_empty() {
        return None;
    }
    Some(SpeechRequest {
        text: text.to_string(),
        voice: project.idea.voice.clone(),
    })
}

pub fn portrait_request(project: &ProjectSnapshot, character: &Character) -> PortraitRequest {
    let description = match character.avatar_prompt.as_deref().map(str::trim) {
        Some(custom) if !custom.is_empty() => custom.to_string(),
        _ => {
            let mut text = format!("Character portrait of {}", character.name);
            if !character.role.trim().is_empty() {
                text.push_str(&format!(", {}", character.role.trim()));
            }
            if !character.description.trim().is_empty() {
                text.push_str(&format!(". {}", character.description.trim()));
            }
            if !character.consistency_rules.is_empty() {
                text.push_str(&format!(". {}", character.consistency_rules.join(", ")));
            }
            if !project.idea.style.trim().is_empty() {
                text.push_str(&format!(". Style: {}", project.idea.style.trim()));
            }
            text
        }
    };

    PortraitRequest {
        description,
        seed: project.idea.seed,
    }
}
