//! Voice preprocessing adapters: ffmpeg transcoding and Whisper
//! speech-to-text.

pub mod ffmpeg;
pub mod whisper;

pub use ffmpeg::FfmpegTranscoder;
pub use whisper::WhisperTranscriber;
