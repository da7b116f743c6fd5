// WAV container encoding for narration PCM
//
// The narration model returns raw 16-bit little-endian mono PCM. Wrapping
// it only needs the canonical 44-byte RIFF/WAVE header; the sample bytes
// are copied through untouched.

use crate::audio::AudioError;

/// Native output rate of the narration model
pub const DEFAULT_NARRATION_SAMPLE_RATE: u32 = 24_000;

/// Size of the canonical PCM header
pub const WAV_HEADER_LEN: usize = 44;

const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const PCM_FORMAT: u16 = 1;

/// Fields of a canonical PCM WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub sample_rate: u32,
    pub num_channels: u16,
    pub bits_per_sample: u16,
    /// Length of the data chunk in bytes
    pub data_len: u32,
}

impl WavHeader {
    /// Header for mono 16-bit PCM
    pub fn mono_pcm16(sample_rate: u32, data_len: u32) -> Self {
        Self {
            sample_rate,
            num_channels: NUM_CHANNELS,
            bits_per_sample: BITS_PER_SAMPLE,
            data_len,
        }
    }

    /// Header fields are fixed-width and wrap like the RIFF sizes do
    pub fn block_align(&self) -> u16 {
        self.num_channels.wrapping_mul(self.bits_per_sample / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.wrapping_mul(self.block_align() as u32)
    }

    /// Serialize to the 44-byte layout, all integers little-endian
    pub fn to_bytes(&self) -> [u8; WAV_HEADER_LEN] {
        let mut header = [0u8; WAV_HEADER_LEN];

        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&(36u32.wrapping_add(self.data_len)).to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&16u32.to_le_bytes());
        header[20..22].copy_from_slice(&PCM_FORMAT.to_le_bytes());
        header[22..24].copy_from_slice(&self.num_channels.to_le_bytes());
        header[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        header[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        header[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());

        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&self.data_len.to_le_bytes());

        header
    }

    /// Read back a canonical 44-byte header
    ///
    /// Only the fixed layout written by `to_bytes` is accepted; files with
    /// extra chunks should go through `decode_wav` instead.
    pub fn parse(bytes: &[u8]) -> Result<Self, AudioError> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(AudioError::InvalidHeader(format!(
                "expected at least {} bytes, got {}",
                WAV_HEADER_LEN,
                bytes.len()
            )));
        }

        let tag = |offset: usize, expected: &[u8; 4]| -> Result<(), AudioError> {
            if &bytes[offset..offset + 4] == expected {
                Ok(())
            } else {
                Err(AudioError::InvalidHeader(format!(
                    "missing {:?} tag at offset {}",
                    String::from_utf8_lossy(expected),
                    offset
                )))
            }
        };
        let u16_at = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        let u32_at = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        tag(0, b"RIFF")?;
        tag(8, b"WAVE")?;
        tag(12, b"fmt ")?;
        tag(36, b"data")?;

        if u16_at(20) != PCM_FORMAT {
            return Err(AudioError::InvalidHeader(format!(
                "unsupported audio format {}",
                u16_at(20)
            )));
        }

        Ok(Self {
            num_channels: u16_at(22),
            sample_rate: u32_at(24),
            bits_per_sample: u16_at(34),
            data_len: u32_at(40),
        })
    }
}

/// Wrap raw mono 16-bit PCM in a WAV container
///
/// No resampling, no validation of sample alignment: the output is the
/// header followed by `pcm` verbatim, `44 + pcm.len()` bytes in total.
pub fn encode_wav(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    let header = WavHeader::mono_pcm16(sample_rate, pcm.len() as u32);

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    wav.extend_from_slice(&header.to_bytes());
    wav.extend_from_slice(pcm);
    wav
}

/// `encode_wav` at the narration model's native rate
pub fn encode_narration_wav(pcm: &[u8]) -> Vec<u8> {
    encode_wav(pcm, DEFAULT_NARRATION_SAMPLE_RATE)
}
