// Narration audio: WAV container encoding, PCM decoding and file export

pub mod decode;
pub mod export;
pub mod format_conversion;
pub mod wav;

pub use decode::{PcmBuffer, decode_pcm_i16, decode_wav};
pub use export::{ExportSettings, NarrationExporter};
pub use wav::{DEFAULT_NARRATION_SAMPLE_RATE, WavHeader, encode_wav};

/// Audio error types
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Invalid WAV header: {0}")]
    InvalidHeader(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid audio payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
