// Sample format conversion between 16-bit PCM and normalized f32
//
// Normalization divides by 32768 so i16::MIN maps to exactly -1.0 and
// i16::MAX lands just below 1.0: the range is [-1.0, 1.0).

/// Scale factor between i16 samples and normalized floats
pub const I16_SCALE: f32 = 32768.0;

/// Convert i16 sample to f32 in [-1.0, 1.0)
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / I16_SCALE
}

/// Convert f32 sample to i16
///
/// Clamps values outside the representable range instead of wrapping.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample * I16_SCALE)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Convert a buffer of normalized floats to little-endian PCM bytes
pub fn f32_to_pcm16_le(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&s| f32_to_i16(s).to_le_bytes())
        .collect()
}

/// Read little-endian i16 samples; a trailing odd byte is ignored
pub fn pcm16_le_to_i16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
