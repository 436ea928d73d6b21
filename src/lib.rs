//! Turn a public Instagram post into a recipe.
//!
//! The caption, photos and videos of a post are downloaded into a working
//! directory, each file is summarized by an inference backend (videos are
//! transcoded to audio and transcribed first) and the summaries are merged
//! into a short recipe: a description, the ingredients and the steps.

pub mod aggregate;
pub mod builder;
pub mod config;
pub mod download;
pub mod error;
pub mod media_to_text;
pub mod metadata;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod shortcode;
pub mod transcode;

pub use builder::PipelineBuilder;
pub use config::AppConfig;
pub use error::{
    AnalysisError, DownloadError, MetadataError, PipelineError, ProviderError, Stage,
    TranscodeError,
};
pub use model::{AssetDescriptor, AssetSummary, DownloadedFile, MediaKind, PipelineResult};
pub use pipeline::Pipeline;
pub use shortcode::{extract_identifier, validate_post_domain};

/// Summarize a post using the configuration from `config.toml` and the environment
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let result = insta_recipe_import::summarize_post("https://www.instagram.com/p/C7h7ksJOBvc/").await?;
/// println!("{}", result.summary);
/// # Ok(())
/// # }
/// ```
pub async fn summarize_post(post_url: &str) -> Result<PipelineResult, PipelineError> {
    let config = AppConfig::load()?;
    summarize_post_with_config(post_url, config).await
}

/// Summarize a post with an explicit configuration.
///
/// The URL host is checked against `metadata.allowed_domain` before any
/// network call is made.
pub async fn summarize_post_with_config(
    post_url: &str,
    config: AppConfig,
) -> Result<PipelineResult, PipelineError> {
    validate_post_domain(post_url, &config.metadata.allowed_domain)?;
    Pipeline::builder().config(config).build()?.run(post_url).await
}
