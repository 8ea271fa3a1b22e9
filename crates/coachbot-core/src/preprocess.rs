//! Voice preprocessing: persist, transcode, transcribe.
//!
//! Each voice exchange gets its own temporary directory under the voices
//! directory. The directory (original and transcoded audio) is owned by a
//! [`VoiceArtifacts`] guard and removed when the guard drops, on success
//! and on every error path.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use coachbot_types::error::PreprocessError;
use tempfile::TempDir;
use tracing::debug;

/// Container conversion of an audio file (e.g. OGG/Opus to MP3).
pub trait AudioTranscoder: Send + Sync {
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<(), PreprocessError>> + Send;
}

/// Speech-to-text over an audio file.
pub trait SpeechToText: Send + Sync {
    fn transcribe(
        &self,
        audio_path: &Path,
    ) -> impl Future<Output = Result<String, PreprocessError>> + Send;
}

/// Temporary audio files of one voice exchange. Dropping removes them.
#[derive(Debug)]
pub struct VoiceArtifacts {
    dir: TempDir,
    source: PathBuf,
    transcoded: PathBuf,
}

impl VoiceArtifacts {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// The audio as downloaded.
    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// The transcoded audio sent to speech-to-text.
    pub fn transcoded_path(&self) -> &Path {
        &self.transcoded
    }
}

pub struct VoicePreprocessor<T: AudioTranscoder, S: SpeechToText> {
    transcoder: T,
    stt: S,
    voices_dir: PathBuf,
}

impl<T: AudioTranscoder, S: SpeechToText> VoicePreprocessor<T, S> {
    pub fn new(transcoder: T, stt: S, voices_dir: PathBuf) -> Self {
        Self {
            transcoder,
            stt,
            voices_dir,
        }
    }

    pub fn voices_dir(&self) -> &Path {
        &self.voices_dir
    }

    /// Write, transcode and transcribe one voice message.
    ///
    /// The returned artifacts must be held until the exchange finishes.
    pub async fn prepare(
        &self,
        audio: &[u8],
        sender: &str,
        at: DateTime<Utc>,
    ) -> Result<(String, VoiceArtifacts), PreprocessError> {
        tokio::fs::create_dir_all(&self.voices_dir).await?;
        let dir = tempfile::Builder::new()
            .prefix("exchange-")
            .tempdir_in(&self.voices_dir)?;

        let base = format!(
            "voice_{}_{}",
            sanitize(sender),
            at.with_timezone(&Local).format("%Y%m%d_%H%M%S")
        );
        let artifacts = VoiceArtifacts {
            source: dir.path().join(format!("{base}.ogg")),
            transcoded: dir.path().join(format!("{base}.mp3")),
            dir,
        };

        tokio::fs::write(&artifacts.source, audio).await?;
        self.transcoder
            .transcode(&artifacts.source, &artifacts.transcoded)
            .await?;
        debug!(path = %artifacts.transcoded.display(), "Voice message transcoded");

        let transcript = self.stt.transcribe(&artifacts.transcoded).await?;
        debug!(chars = transcript.len(), "Voice message transcribed");

        Ok((transcript, artifacts))
    }
}

fn sanitize(sender: &str) -> String {
    sender
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockStt, MockTranscoder};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
    }

    fn dir_is_empty(path: &Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_success_keeps_artifacts_until_drop() {
        let voices = tempfile::tempdir().unwrap();
        let pre = VoicePreprocessor::new(
            MockTranscoder::ok(),
            MockStt::ok("hello there"),
            voices.path().to_path_buf(),
        );

        let (transcript, artifacts) = pre.prepare(b"OggS", "77", at()).await.unwrap();
        assert_eq!(transcript, "hello there");
        assert!(artifacts.source_path().exists());
        assert!(artifacts.transcoded_path().exists());
        assert!(
            artifacts
                .source_path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("voice_77_")
        );

        drop(artifacts);
        assert!(dir_is_empty(voices.path()));
    }

    #[tokio::test]
    async fn test_transcription_failure_removes_both_files() {
        let voices = tempfile::tempdir().unwrap();
        let stt = MockStt::failing();
        let pre = VoicePreprocessor::new(MockTranscoder::ok(), stt, voices.path().to_path_buf());

        let err = pre.prepare(b"OggS", "77", at()).await.unwrap_err();
        assert!(matches!(err, PreprocessError::Transcription(_)));

        let seen = pre.stt.seen_path().unwrap();
        assert!(!seen.exists());
        assert!(!seen.with_extension("ogg").exists());
        assert!(dir_is_empty(voices.path()));
    }

    #[tokio::test]
    async fn test_transcode_failure_removes_source() {
        let voices = tempfile::tempdir().unwrap();
        let pre = VoicePreprocessor::new(
            MockTranscoder::failing(),
            MockStt::ok("unused"),
            voices.path().to_path_buf(),
        );

        let err = pre.prepare(b"OggS", "77", at()).await.unwrap_err();
        assert!(matches!(err, PreprocessError::Transcode(_)));
        assert!(dir_is_empty(voices.path()));
    }

    #[test]
    fn test_sanitize_sender() {
        assert_eq!(sanitize("12/../x"), "12____x");
    }
}
