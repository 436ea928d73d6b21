use log::{debug, info};
use std::sync::Arc;

use crate::error::ProviderError;
use crate::model::AssetSummary;
use crate::providers::{aggregation_request, InferenceBackend};

/// Merges the per-asset summaries of a post into one recipe
pub struct Aggregator {
    backend: Arc<dyn InferenceBackend>,
    max_tokens: u32,
}

impl Aggregator {
    pub fn new(backend: Arc<dyn InferenceBackend>, max_tokens: u32) -> Self {
        Self {
            backend,
            max_tokens,
        }
    }

    /// One backend call over the newline-joined summaries, in order.
    ///
    /// There is no fallback: when the call fails the summaries are dropped
    /// and the error is returned.
    pub async fn aggregate(&self, summaries: &[AssetSummary]) -> Result<String, ProviderError> {
        let combined = combine(summaries);
        debug!(
            "Aggregating {} summaries ({} chars) with {}",
            summaries.len(),
            combined.len(),
            self.backend.provider_name()
        );

        let recipe = self
            .backend
            .complete(&aggregation_request(&combined), self.max_tokens)
            .await?;
        info!("Created recipe instruction from {} summaries", summaries.len());
        Ok(recipe)
    }
}

fn combine(summaries: &[AssetSummary]) -> String {
    let mut combined = String::new();
    for summary in summaries {
        combined.push_str(&summary.text);
        combined.push('\n');
    }
    combined
}
