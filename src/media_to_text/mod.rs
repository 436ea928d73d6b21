use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::OpenAIConfig;
use crate::error::AnalysisError;
use crate::model::AssetSummary;
use crate::providers::{
    text_summary_request, InferenceBackend, AUDIO_TRANSCRIPTION_PROMPT, IMAGE_SUMMARY_PROMPT,
};
use crate::transcode::Transcoder;

/// What kind of analysis a file gets, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Image,
    Video,
}

impl ContentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "txt" => Some(ContentKind::Text),
            "jpg" | "jpeg" | "png" => Some(ContentKind::Image),
            "mp4" | "avi" | "mkv" => Some(ContentKind::Video),
            _ => None,
        }
    }
}

/// Output budgets for the per-file backend calls
#[derive(Debug, Clone, Copy)]
pub struct AnalysisLimits {
    pub text_max_tokens: u32,
    pub vision_max_tokens: u32,
}

impl From<&OpenAIConfig> for AnalysisLimits {
    fn from(config: &OpenAIConfig) -> Self {
        Self {
            text_max_tokens: config.text_max_tokens,
            vision_max_tokens: config.vision_max_tokens,
        }
    }
}

impl Default for AnalysisLimits {
    fn default() -> Self {
        Self::from(&OpenAIConfig::default())
    }
}

/// Turns a downloaded file into a short natural-language summary
pub struct ContentAnalyzer {
    backend: Arc<dyn InferenceBackend>,
    transcoder: Arc<dyn Transcoder>,
    limits: AnalysisLimits,
}

impl ContentAnalyzer {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        transcoder: Arc<dyn Transcoder>,
        limits: AnalysisLimits,
    ) -> Self {
        Self {
            backend,
            transcoder,
            limits,
        }
    }

    /// Summarize one file. Files of unsupported kinds yield `Ok(None)`.
    pub async fn analyze(&self, path: &Path) -> Result<Option<AssetSummary>, AnalysisError> {
        let Some(kind) = ContentKind::from_path(path) else {
            debug!("Skipping {}: unsupported file type", path.display());
            return Ok(None);
        };

        let text = match kind {
            ContentKind::Text => self.analyze_text(path).await?,
            ContentKind::Image => self.analyze_image(path).await?,
            ContentKind::Video => self.analyze_video(path).await?,
        };
        info!("Analyzed {} as {:?}", path.display(), kind);

        Ok(Some(AssetSummary {
            source: path.to_path_buf(),
            text,
        }))
    }

    async fn analyze_text(&self, path: &Path) -> Result<String, AnalysisError> {
        let content = read_to_string(path).await?;
        let summary = self
            .backend
            .complete(&text_summary_request(&content), self.limits.text_max_tokens)
            .await?;
        Ok(summary)
    }

    async fn analyze_image(&self, path: &Path) -> Result<String, AnalysisError> {
        let image_data = tokio::fs::read(path)
            .await
            .map_err(|source| read_error(path, source))?;
        let base64 = STANDARD.encode(&image_data);

        let summary = self
            .backend
            .describe_image(
                IMAGE_SUMMARY_PROMPT,
                &base64,
                image_mime_type(path),
                self.limits.vision_max_tokens,
            )
            .await?;
        Ok(summary)
    }

    async fn analyze_video(&self, path: &Path) -> Result<String, AnalysisError> {
        let audio = audio_path(path);
        self.transcoder.to_audio(path, &audio).await?;

        let transcript = self
            .backend
            .transcribe(&audio, AUDIO_TRANSCRIPTION_PROMPT)
            .await?;
        Ok(transcript)
    }
}

async fn read_to_string(path: &Path) -> Result<String, AnalysisError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| read_error(path, source))
}

fn read_error(path: &Path, source: std::io::Error) -> AnalysisError {
    AnalysisError::Read {
        path: path.to_path_buf(),
        source,
    }
}

/// Same-stem `.mp3` sibling of a video file
pub fn audio_path(video: &Path) -> PathBuf {
    video.with_extension("mp3")
}

fn image_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, TranscodeError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    type CallLog = Arc<Mutex<Vec<String>>>;

    struct RecordingBackend {
        calls: CallLog,
        fail: bool,
    }

    #[async_trait]
    impl InferenceBackend for RecordingBackend {
        fn provider_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("complete:{}", max_tokens));
            if self.fail {
                return Err(ProviderError::MalformedResponse);
            }
            Ok(format!("text summary of {} chars", prompt.len()))
        }

        async fn describe_image(
            &self,
            _instruction: &str,
            image_base64: &str,
            mime_type: &str,
            _max_tokens: u32,
        ) -> Result<String, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("image:{}:{}", mime_type, image_base64));
            Ok("a plate of dumplings".to_string())
        }

        async fn transcribe(
            &self,
            audio_path: &Path,
            prompt: &str,
        ) -> Result<String, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("transcribe:{}", audio_path.display()));
            assert_eq!(prompt, AUDIO_TRANSCRIPTION_PROMPT);
            Ok("whisk the eggs".to_string())
        }
    }

    struct RecordingTranscoder {
        calls: CallLog,
        fail: bool,
    }

    #[async_trait]
    impl Transcoder for RecordingTranscoder {
        async fn to_audio(&self, video: &Path, audio: &Path) -> Result<(), TranscodeError> {
            self.calls.lock().unwrap().push(format!(
                "transcode:{}->{}",
                video.display(),
                audio.display()
            ));
            if self.fail {
                return Err(TranscodeError::Failed {
                    status: "exit status: 1".to_string(),
                    stderr: "broken stream".to_string(),
                });
            }
            Ok(())
        }
    }

    fn analyzer(calls: &CallLog, backend_fails: bool, transcoder_fails: bool) -> ContentAnalyzer {
        ContentAnalyzer::new(
            Arc::new(RecordingBackend {
                calls: calls.clone(),
                fail: backend_fails,
            }),
            Arc::new(RecordingTranscoder {
                calls: calls.clone(),
                fail: transcoder_fails,
            }),
            AnalysisLimits::default(),
        )
    }

    #[test]
    fn test_content_kind_from_path() {
        assert_eq!(
            ContentKind::from_path(Path::new("a/description.txt")),
            Some(ContentKind::Text)
        );
        assert_eq!(
            ContentKind::from_path(Path::new("1_0.JPG")),
            Some(ContentKind::Image)
        );
        assert_eq!(
            ContentKind::from_path(Path::new("1_0.png")),
            Some(ContentKind::Image)
        );
        assert_eq!(
            ContentKind::from_path(Path::new("1_0.mkv")),
            Some(ContentKind::Video)
        );
        assert_eq!(ContentKind::from_path(Path::new("1_0.pdf")), None);
        assert_eq!(ContentKind::from_path(Path::new("no_extension")), None);
    }

    #[tokio::test]
    async fn test_video_is_transcoded_once_before_transcription() {
        let calls = CallLog::default();
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("5_0.mp4");
        std::fs::write(&video, b"mp4").unwrap();

        let summary = analyzer(&calls, false, false)
            .analyze(&video)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.text, "whisk the eggs");
        assert_eq!(summary.source, video);
        let audio = dir.path().join("5_0.mp3");
        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                format!("transcode:{}->{}", video.display(), audio.display()),
                format!("transcribe:{}", audio.display()),
            ]
        );
    }

    #[tokio::test]
    async fn test_image_is_sent_as_base64() {
        let calls = CallLog::default();
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("5_1.png");
        std::fs::write(&image, b"hello").unwrap();

        let summary = analyzer(&calls, false, false)
            .analyze(&image)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.text, "a plate of dumplings");
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["image:image/png:aGVsbG8=".to_string()]
        );
    }

    #[tokio::test]
    async fn test_text_uses_bounded_completion() {
        let calls = CallLog::default();
        let dir = TempDir::new().unwrap();
        let caption = dir.path().join("description.txt");
        std::fs::write(&caption, "Miso soup: dashi, miso, tofu").unwrap();

        let summary = analyzer(&calls, false, false)
            .analyze(&caption)
            .await
            .unwrap();

        assert!(summary.is_some());
        assert_eq!(*calls.lock().unwrap(), vec!["complete:100".to_string()]);
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_skipped() {
        let calls = CallLog::default();
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("menu.pdf");
        std::fs::write(&pdf, b"%PDF").unwrap();

        let summary = analyzer(&calls, false, false).analyze(&pdf).await.unwrap();

        assert!(summary.is_none());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transcode_failure_skips_transcription() {
        let calls = CallLog::default();
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("5_0.mp4");
        std::fs::write(&video, b"mp4").unwrap();

        let result = analyzer(&calls, false, true).analyze(&video).await;

        assert!(matches!(result, Err(AnalysisError::Transcode(_))));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let calls = CallLog::default();
        let dir = TempDir::new().unwrap();

        let result = analyzer(&calls, false, false)
            .analyze(&dir.path().join("missing.jpg"))
            .await;

        assert!(matches!(result, Err(AnalysisError::Read { .. })));
    }

    #[tokio::test]
    async fn test_backend_failure_is_reported() {
        let calls = CallLog::default();
        let dir = TempDir::new().unwrap();
        let caption = dir.path().join("description.txt");
        std::fs::write(&caption, "text").unwrap();

        let result = analyzer(&calls, true, false).analyze(&caption).await;

        assert!(matches!(result, Err(AnalysisError::Backend(_))));
    }

    #[test]
    fn test_audio_path() {
        assert_eq!(
            audio_path(Path::new("downloads/abc/1_0.mp4")),
            PathBuf::from("downloads/abc/1_0.mp3")
        );
    }
}
