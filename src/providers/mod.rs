mod open_ai;
mod prompt;

pub use open_ai::OpenAIProvider;
pub use prompt::{
    aggregation_request, text_summary_request, AUDIO_TRANSCRIPTION_PROMPT,
    IMAGE_SUMMARY_PROMPT, RECIPE_AGGREGATION_PROMPT, TEXT_SUMMARY_PROMPT,
};

use async_trait::async_trait;
use std::path::Path;

use crate::error::ProviderError;

/// Unified trait for the inference backend used by the analyzers and the aggregator
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Get the provider name (e.g., "openai")
    fn provider_name(&self) -> &str;

    /// Chat-style text completion
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError>;

    /// Chat-style completion over an instruction and a base64-encoded image
    async fn describe_image(
        &self,
        instruction: &str,
        image_base64: &str,
        mime_type: &str,
        max_tokens: u32,
    ) -> Result<String, ProviderError>;

    /// Speech-to-text for an audio file, guided by a prompt hint
    async fn transcribe(&self, audio_path: &Path, prompt: &str) -> Result<String, ProviderError>;
}
