use async_trait::async_trait;
use log::{debug, info};
use std::path::Path;
use tokio::process::Command;

use crate::error::TranscodeError;

/// Converts a video file into an audio file
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Write the audio track of `video` to `audio`, returning once the
    /// conversion has finished or failed
    async fn to_audio(&self, video: &Path, audio: &Path) -> Result<(), TranscodeError>;
}

/// Transcoder backed by the `ffmpeg` command line tool
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn to_audio(&self, video: &Path, audio: &Path) -> Result<(), TranscodeError> {
        debug!(
            "Running {} on {} -> {}",
            self.binary,
            video.display(),
            audio.display()
        );

        let output = Command::new(&self.binary)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(video)
            .arg("-vn")
            .arg(audio)
            .output()
            .await
            .map_err(TranscodeError::Spawn)?;

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!("Converted {} to {}", video.display(), audio.display());
        Ok(())
    }
}
