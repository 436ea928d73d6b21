use futures_util::stream::{self, StreamExt};
use log::{error, info};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::time::{timeout_at, Instant};

use crate::aggregate::Aggregator;
use crate::builder::PipelineBuilder;
use crate::download::MediaDownloader;
use crate::error::{PipelineError, Stage};
use crate::media_to_text::ContentAnalyzer;
use crate::metadata::MetadataFetcher;
use crate::model::{AssetDescriptor, AssetSummary, PipelineResult};
use crate::shortcode::extract_identifier;

/// File holding the post caption inside the working directory
pub const CAPTION_FILE_NAME: &str = "description.txt";

/// Turns one post URL into one recipe summary.
///
/// A run moves through the stages of [`Stage`] in order. Every failure ends
/// the run and is reported with the stage it happened in; nothing is retried
/// and nothing already written to the working directory is removed.
pub struct Pipeline {
    pub(crate) fetcher: MetadataFetcher,
    pub(crate) downloader: MediaDownloader,
    pub(crate) analyzer: ContentAnalyzer,
    pub(crate) aggregator: Aggregator,
    pub(crate) working_root: PathBuf,
    pub(crate) workers: usize,
    pub(crate) deadline: Option<Duration>,
    pub(crate) file_mtime: Option<SystemTime>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Run the pipeline for a post URL
    pub async fn run(&self, post_url: &str) -> Result<PipelineResult, PipelineError> {
        let deadline = self.deadline.map(|limit| Instant::now() + limit);
        let result = self.execute(post_url, deadline).await;

        if let Err(e) = &result {
            match e.stage() {
                Some(stage) => error!("Pipeline failed while {}: {}", stage, e),
                None => error!("Pipeline failed: {}", e),
            }
        }
        result
    }

    async fn execute(
        &self,
        post_url: &str,
        deadline: Option<Instant>,
    ) -> Result<PipelineResult, PipelineError> {
        enter(Stage::Extracting);
        let id = extract_identifier(post_url)?;
        info!("Extracted shortcode: {}", id);

        enter(Stage::FetchingMetadata);
        let assets = within(deadline, Stage::FetchingMetadata, async {
            self.fetcher
                .fetch(&id)
                .await
                .map_err(PipelineError::MetadataFetch)
        })
        .await?;

        enter(Stage::PersistingCaption);
        let dir = self.working_root.join(id.as_str());
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| PipelineError::WorkingDirectory {
                path: dir.clone(),
                source,
            })?;

        let caption = assets.first().and_then(|asset| asset.caption.as_deref());
        let caption_summary = match persist_caption(&dir, caption)
            .await
            .map_err(PipelineError::PersistCaption)?
        {
            Some(caption_path) => {
                within(deadline, Stage::PersistingCaption, async {
                    self.analyzer
                        .analyze(&caption_path)
                        .await
                        .map_err(PipelineError::CaptionAnalysis)
                })
                .await?
            }
            None => None,
        };

        // Media first, caption last, as the working directory lists them
        let mut summaries = self.download_and_analyze(&dir, &assets, deadline).await?;
        summaries.extend(caption_summary);

        enter(Stage::Aggregating);
        let summary = within(deadline, Stage::Aggregating, async {
            self.aggregator
                .aggregate(&summaries)
                .await
                .map_err(PipelineError::Aggregation)
        })
        .await?;

        enter(Stage::Done);
        Ok(PipelineResult {
            summary,
            working_directory: dir,
        })
    }

    /// Download then analyze every asset, at most `workers` at a time.
    ///
    /// Results land in a slot per asset position so the output keeps the
    /// post order whatever order the workers finish in. The first failure
    /// drops the remaining work.
    async fn download_and_analyze(
        &self,
        dir: &Path,
        assets: &[AssetDescriptor],
        deadline: Option<Instant>,
    ) -> Result<Vec<AssetSummary>, PipelineError> {
        // No source timestamp is exposed by the API
        let mtime = self.file_mtime.unwrap_or_else(SystemTime::now);
        let mut slots: Vec<Option<AssetSummary>> = vec![None; assets.len()];

        let mut results = stream::iter(assets.iter().enumerate())
            .map(|(index, asset)| async move {
                let stage = Stage::DownloadingAndAnalyzing(index);
                enter(stage);
                let summary =
                    within(deadline, stage, self.process_asset(dir, index, asset, mtime)).await;
                (index, summary)
            })
            .buffer_unordered(self.workers.max(1));

        while let Some((index, summary)) = results.next().await {
            slots[index] = summary?;
        }

        Ok(slots.into_iter().flatten().collect())
    }

    async fn process_asset(
        &self,
        dir: &Path,
        index: usize,
        asset: &AssetDescriptor,
        mtime: SystemTime,
    ) -> Result<Option<AssetSummary>, PipelineError> {
        let base_name = format!("{}_{}", asset.id, index);
        let file = self
            .downloader
            .download(dir, &base_name, asset.download_url(), mtime)
            .await
            .map_err(|source| PipelineError::Download { index, source })?;

        self.analyzer
            .analyze(&file.path)
            .await
            .map_err(|source| PipelineError::Analysis { index, source })
    }
}

fn enter(stage: Stage) {
    info!("Pipeline stage: {}", stage);
}

/// Await `future`, giving up with [`PipelineError::Cancelled`] once the deadline passes
async fn within<T, F>(
    deadline: Option<Instant>,
    stage: Stage,
    future: F,
) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    match deadline {
        Some(deadline) => timeout_at(deadline, future)
            .await
            .map_err(|_| PipelineError::Cancelled(stage))?,
        None => future.await,
    }
}

/// Write the caption next to the media. Nothing is written for an empty caption.
async fn persist_caption(dir: &Path, caption: Option<&str>) -> std::io::Result<Option<PathBuf>> {
    match caption {
        Some(text) if !text.is_empty() => {
            let path = dir.join(CAPTION_FILE_NAME);
            fs::write(&path, text).await?;
            Ok(Some(path))
        }
        _ => Ok(None),
    }
}
