// Narration Export - Scene voiceover audio to WAV files
//
// Scene audio is stored as base64 raw PCM inside the document. Export
// decodes the payload, prepends the WAV header and writes one file per
// scene, named by the scene's position in the storyboard.

use crate::audio::AudioError;
use crate::audio::wav::{DEFAULT_NARRATION_SAMPLE_RATE, encode_wav};
use crate::project::types::{ProjectSnapshot, Scene};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Narration export settings
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Sample rate written into the header (Hz)
    pub sample_rate: u32,
    /// File name prefix, followed by the 1-based scene position
    pub file_prefix: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_NARRATION_SAMPLE_RATE,
            file_prefix: "scene_".to_string(),
        }
    }
}

/// Decode a scene's audio payload into raw PCM bytes
///
/// Returns `Ok(None)` when the scene has no audio or the payload is empty.
pub fn scene_pcm(scene: &Scene) -> Result<Option<Vec<u8>>, AudioError> {
    let Some(payload) = scene.audio.as_ref().and_then(|a| a.data.as_deref()) else {
        return Ok(None);
    };
    if payload.is_empty() {
        return Ok(None);
    }

    let pcm = BASE64.decode(payload.trim())?;
    if pcm.is_empty() {
        return Ok(None);
    }
    Ok(Some(pcm))
}

/// Scene audio as a playable WAV buffer, or `None` without a payload
pub fn scene_wav(scene: &Scene, sample_rate: u32) -> Result<Option<Vec<u8>>, AudioError> {
    Ok(scene_pcm(scene)?.map(|pcm| encode_wav(&pcm, sample_rate)))
}

/// Writes narration WAV files
pub struct NarrationExporter {
    settings: ExportSettings,
}

impl NarrationExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// File name for the scene at `position` (0-based)
    pub fn file_name(&self, position: usize) -> String {
        format!("{}{}.wav", self.settings.file_prefix, position + 1)
    }

    /// Export one scene; a scene without audio is skipped with `Ok(None)`
    pub fn export_scene(
        &self,
        scene: &Scene,
        position: usize,
        out_dir: &Path,
    ) -> Result<Option<PathBuf>, AudioError> {
        let Some(wav) = scene_wav(scene, self.settings.sample_rate)? else {
            debug!("Scene {} has no narration, skipping", position + 1);
            return Ok(None);
        };

        std::fs::create_dir_all(out_dir)?;
        let path = out_dir.join(self.file_name(position));
        std::fs::write(&path, &wav)?;

        debug!("Wrote {} ({} bytes)", path.display(), wav.len());
        Ok(Some(path))
    }

    /// Export every scene with narration, in storyboard order
    pub fn export_all(
        &self,
        project: &ProjectSnapshot,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, AudioError> {
        let mut written = Vec::new();
        for (position, scene) in project.scenes.iter().enumerate() {
            if let Some(path) = self.export_scene(scene, position, out_dir)? {
                written.push(path);
            }
        }

        info!(
            "Exported {} of {} scene narrations to {}",
            written.len(),
            project.scenes.len(),
            out_dir.display()
        );
        Ok(written)
    }
}

impl Default for NarrationExporter {
    fn default() -> Self {
        Self::new(ExportSettings::default())
    }
}
