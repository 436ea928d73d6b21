use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::Client;

use crate::aggregate::Aggregator;
use crate::config::AppConfig;
use crate::download::MediaDownloader;
use crate::media_to_text::{AnalysisLimits, ContentAnalyzer};
use crate::metadata::MetadataFetcher;
use crate::pipeline::Pipeline;
use crate::providers::{InferenceBackend, OpenAIProvider};
use crate::transcode::{FfmpegTranscoder, Transcoder};
use crate::PipelineError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Builder for assembling a [`Pipeline`]
///
/// Everything not set explicitly comes from the [`AppConfig`] (or its
/// defaults when no config is given).
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<AppConfig>,
    backend: Option<Arc<dyn InferenceBackend>>,
    transcoder: Option<Arc<dyn Transcoder>>,
    client: Option<Client>,
    workers: Option<usize>,
    deadline: Option<Duration>,
    working_root: Option<PathBuf>,
    file_mtime: Option<SystemTime>,
}

impl PipelineBuilder {
    /// Use a loaded configuration
    ///
    /// # Example
    /// ```
    /// use insta_recipe_import::{AppConfig, Pipeline};
    ///
    /// let builder = Pipeline::builder().config(AppConfig::default());
    /// ```
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom inference backend instead of the OpenAI provider
    pub fn backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use a custom transcoder instead of `ffmpeg`
    pub fn transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    /// Share an HTTP client for metadata, media and the default backend
    pub fn http_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Number of assets processed at once
    ///
    /// # Example
    /// ```
    /// use insta_recipe_import::Pipeline;
    ///
    /// let builder = Pipeline::builder().workers(3);
    /// ```
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Abort runs that take longer than `duration`
    pub fn deadline(mut self, duration: Duration) -> Self {
        self.deadline = Some(duration);
        self
    }

    /// Directory under which per-post working directories are created
    pub fn working_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.working_root = Some(root.into());
        self
    }

    /// Modification time stamped on downloaded files (defaults to now)
    pub fn file_mtime(mut self, mtime: SystemTime) -> Self {
        self.file_mtime = Some(mtime);
        self
    }

    /// Assemble the pipeline
    ///
    /// # Errors
    /// Returns `PipelineError::Builder` if:
    /// - The HTTP client cannot be created
    /// - No backend was given and no OpenAI API key is configured
    /// - The worker count is zero
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let config = self.config.unwrap_or_default();

        let timeout = Duration::from_secs(config.timeout);
        // Connect-only bound; inference calls and media bodies have no total limit
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .connect_timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .map_err(|e| {
                    PipelineError::Builder(format!("Failed to create HTTP client: {}", e))
                })?,
        };

        let backend: Arc<dyn InferenceBackend> = match self.backend {
            Some(backend) => backend,
            None => Arc::new(
                OpenAIProvider::new(client.clone(), &config.openai)
                    .map_err(|e| PipelineError::Builder(e.to_string()))?,
            ),
        };

        let transcoder: Arc<dyn Transcoder> = match self.transcoder {
            Some(transcoder) => transcoder,
            None => Arc::new(FfmpegTranscoder::new(config.pipeline.ffmpeg_path.clone())),
        };

        let workers = self.workers.unwrap_or(config.pipeline.workers);
        if workers == 0 {
            return Err(PipelineError::Builder(
                "At least one worker is required".to_string(),
            ));
        }

        let deadline = self
            .deadline
            .or_else(|| config.pipeline.deadline_secs.map(Duration::from_secs));
        let file_mtime = self.file_mtime.or_else(|| {
            config
                .download
                .file_mtime
                .map(|secs| UNIX_EPOCH + Duration::from_secs(secs))
        });
        let working_root = self
            .working_root
            .unwrap_or_else(|| PathBuf::from(&config.download.root));

        Ok(Pipeline {
            fetcher: MetadataFetcher::new(client.clone(), &config.metadata).with_timeout(timeout),
            downloader: MediaDownloader::new(client),
            analyzer: ContentAnalyzer::new(
                backend.clone(),
                transcoder,
                AnalysisLimits::from(&config.openai),
            ),
            aggregator: Aggregator::new(backend, config.openai.aggregate_max_tokens),
            working_root,
            workers,
            deadline,
            file_mtime,
        })
    }
}
