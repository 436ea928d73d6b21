use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Position of a pipeline run, used to report where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    FetchingMetadata,
    PersistingCaption,
    /// Download and analysis of the asset at this position
    DownloadingAndAnalyzing(usize),
    Aggregating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extracting => write!(f, "extracting"),
            Stage::FetchingMetadata => write!(f, "fetching metadata"),
            Stage::PersistingCaption => write!(f, "persisting caption"),
            Stage::DownloadingAndAnalyzing(index) => {
                write!(f, "downloading and analyzing asset {}", index)
            }
            Stage::Aggregating => write!(f, "aggregating"),
            Stage::Done => write!(f, "done"),
        }
    }
}

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The URL is not a post URL of the form `.../p/<identifier>/...`
    #[error("Invalid post URL format: {0}")]
    InvalidUrlFormat(String),

    /// The URL points at another host than the supported platform
    #[error("Only {expected} URLs are supported, got {url}")]
    UnsupportedDomain { url: String, expected: String },

    #[error("Failed to fetch post metadata: {0}")]
    MetadataFetch(#[from] MetadataError),

    #[error("Failed to prepare working directory {}: {source}", path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save caption: {0}")]
    PersistCaption(#[source] std::io::Error),

    #[error("Failed to analyze caption: {0}")]
    CaptionAnalysis(#[source] AnalysisError),

    #[error("Failed to download asset {index}: {source}")]
    Download {
        index: usize,
        #[source]
        source: DownloadError,
    },

    #[error("Failed to analyze asset {index}: {source}")]
    Analysis {
        index: usize,
        #[source]
        source: AnalysisError,
    },

    #[error("Failed to create recipe instruction: {0}")]
    Aggregation(#[source] ProviderError),

    /// The caller-supplied deadline passed while waiting at this stage
    #[error("Deadline exceeded while {0}")]
    Cancelled(Stage),

    #[error("Builder error: {0}")]
    Builder(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl PipelineError {
    /// The stage the run was in when it failed, if the error came from a run
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::InvalidUrlFormat(_) | PipelineError::UnsupportedDomain { .. } => {
                Some(Stage::Extracting)
            }
            PipelineError::MetadataFetch(_) => Some(Stage::FetchingMetadata),
            PipelineError::WorkingDirectory { .. }
            | PipelineError::PersistCaption(_)
            | PipelineError::CaptionAnalysis(_) => Some(Stage::PersistingCaption),
            PipelineError::Download { index, .. } | PipelineError::Analysis { index, .. } => {
                Some(Stage::DownloadingAndAnalyzing(*index))
            }
            PipelineError::Aggregation(_) => Some(Stage::Aggregating),
            PipelineError::Cancelled(stage) => Some(*stage),
            PipelineError::Builder(_) | PipelineError::Config(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metadata endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("post not found in metadata response")]
    MissingMedia,
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("failed to download file: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media origin returned {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while turning one file into a summary
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to convert video to audio: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("inference backend failed: {0}")]
    Backend(#[from] ProviderError),
}

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("failed to start transcoder: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("transcoder exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Errors returned by an inference backend
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to extract content from response")]
    MalformedResponse,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Configuration(String),
}
