//! Audio transcoding through an external `ffmpeg` binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use coachbot_core::preprocess::AudioTranscoder;
use coachbot_types::error::PreprocessError;

/// Runs `ffmpeg -y -i <input> <output>`; the output container is chosen by
/// ffmpeg from the output extension.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl AudioTranscoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), PreprocessError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let out = cmd.output().await.map_err(|e| {
            PreprocessError::Transcode(format!(
                "failed to run {}: {e}",
                self.binary.display()
            ))
        })?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(PreprocessError::Transcode(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                out.status,
                stderr.trim()
            )));
        }

        debug!(input = %input.display(), output = %output.display(), "Audio transcoded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_transcode_error() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg-binary");

        let err = transcoder
            .transcode(&dir.path().join("in.ogg"), &dir.path().join("out.mp3"))
            .await
            .unwrap_err();

        assert!(matches!(err, PreprocessError::Transcode(ref m) if m.contains("failed to run")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_transcode_error() {
        let dir = tempfile::tempdir().unwrap();
        // `false` ignores its arguments and exits 1.
        let transcoder = FfmpegTranscoder::new("false");

        let err = transcoder
            .transcode(&dir.path().join("in.ogg"), &dir.path().join("out.mp3"))
            .await
            .unwrap_err();

        assert!(matches!(err, PreprocessError::Transcode(ref m) if m.contains("exited with")));
    }
}
