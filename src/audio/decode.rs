// Decoding PCM payloads into normalized channel buffers for playback

use crate::audio::AudioError;
use crate::audio::format_conversion::{i16_to_f32, pcm16_le_to_i16};
use hound::{SampleFormat, WavReader};
use std::io::Cursor;

/// Deinterleaved audio, one `Vec<f32>` per channel, values in [-1.0, 1.0)
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }
}

/// Interpret raw bytes as interleaved signed 16-bit little-endian samples
///
/// A trailing partial frame is dropped. `num_channels` of 0 is treated as 1.
pub fn decode_pcm_i16(bytes: &[u8], sample_rate: u32, num_channels: usize) -> PcmBuffer {
    let num_channels = num_channels.max(1);
    let samples = pcm16_le_to_i16(bytes);
    let frames = samples.len() / num_channels;

    let mut channels = vec![Vec::with_capacity(frames); num_channels];
    for frame in samples.chunks_exact(num_channels) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(i16_to_f32(sample));
        }
    }

    PcmBuffer {
        sample_rate,
        channels,
    }
}

/// Decode a WAV container holding 16-bit integer PCM
pub fn decode_wav(bytes: &[u8]) -> Result<PcmBuffer, AudioError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(AudioError::UnsupportedFormat(format!(
            "{:?} {}-bit",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let num_channels = spec.channels.max(1) as usize;
    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()?;

    let mut channels = vec![Vec::with_capacity(samples.len() / num_channels); num_channels];
    for frame in samples.chunks_exact(num_channels) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(i16_to_f32(sample));
        }
    }

    Ok(PcmBuffer {
        sample_rate: spec.sample_rate,
        channels,
    })
}
