use std::sync::Arc;

use tracing::{info, warn};

use snaplens_core::{InferenceProvider, InferenceResult, PromptVariant, SnapError};

use crate::prompt::build_request;

/// Literal substituted when the collaborator answers without a content
/// field. A deliberate soft fallback, distinct from a hard failure: the
/// pipeline still broadcasts it.
pub const NO_RESPONSE_FALLBACK: &str = "No response found";

/// One-shot query front-end over an [`InferenceProvider`].
pub struct InferenceClient {
    provider: Arc<dyn InferenceProvider>,
}

impl InferenceClient {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self { provider }
    }

    /// Build the variant's template, issue one call, and return the trimmed
    /// reply. Never retries: network, auth, and malformed-reply errors all
    /// surface as [`SnapError::InferenceFailed`].
    pub async fn query(
        &self,
        input_text: &str,
        variant: PromptVariant,
    ) -> Result<InferenceResult, SnapError> {
        let request = build_request(input_text, variant);

        info!(
            provider = %self.provider.name(),
            variant = %variant,
            input_chars = input_text.len(),
            "Querying inference collaborator"
        );

        let response = self.provider.complete(&request).await?;

        let text = match response.content {
            Some(content) => content.trim().to_string(),
            None => {
                warn!(provider = %response.provider, "Reply had no content; using fallback");
                NO_RESPONSE_FALLBACK.to_string()
            }
        };

        info!(
            provider = %response.provider,
            latency_ms = response.latency_ms,
            "Inference complete"
        );

        Ok(InferenceResult {
            text,
            source_variant: variant,
        })
    }
}
