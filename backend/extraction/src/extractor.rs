use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use snaplens_core::{DeviceRegion, SnapError, Snapshot, TextExtractor};

use crate::crop::crop_to_region;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Recognition engine backed by a vision-capable chat completions endpoint:
/// the crop is sent inline as a base64 data URI and the reply is the dense
/// text read from it.
pub struct VisionExtractor {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct VisionResponse {
    choices: Vec<VisionChoice>,
}

#[derive(Deserialize)]
struct VisionChoice {
    message: VisionMessage,
}

#[derive(Deserialize)]
struct VisionMessage {
    content: Option<String>,
}

impl VisionExtractor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl TextExtractor for VisionExtractor {
    async fn extract_text(
        &self,
        snapshot: &Snapshot,
        region: DeviceRegion,
    ) -> Result<String, SnapError> {
        let crop = crop_to_region(&snapshot.data, region)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&crop);

        info!(
            model = %self.model,
            crop_bytes = crop.len(),
            "Extracting text from cropped region"
        );

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "text",
                        "text": "Read all text visible in this image. Reply with the text only, preserving line breaks."
                    },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/png;base64,{encoded}") }
                    }
                ]
            }],
            "max_tokens": 500,
            "temperature": 0
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SnapError::ExtractionFailed(format!("vision request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SnapError::ExtractionFailed(format!(
                "vision endpoint returned {status}: {error_body}"
            )));
        }

        let parsed: VisionResponse = response
            .json()
            .await
            .map_err(|e| SnapError::ExtractionFailed(format!("malformed vision reply: {e}")))?;

        let text = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| SnapError::ExtractionFailed("vision reply had no content".into()))?;

        debug!(chars = text.len(), "Extraction complete");
        Ok(text.trim().to_string())
    }
}

/// Test/demo extraction engine: returns a fixed text (or a configured
/// failure) and records every crop region it was asked for.
pub struct MockExtractor {
    text: String,
    fail: bool,
    calls: AtomicUsize,
    regions: Mutex<Vec<DeviceRegion>>,
}

impl MockExtractor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fail: false,
            calls: AtomicUsize::new(0),
            regions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            fail: true,
            calls: AtomicUsize::new(0),
            regions: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_regions(&self) -> Vec<DeviceRegion> {
        self.regions.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextExtractor for MockExtractor {
    async fn extract_text(
        &self,
        _snapshot: &Snapshot,
        region: DeviceRegion,
    ) -> Result<String, SnapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.regions.lock().unwrap().push(region);
        if self.fail {
            return Err(SnapError::ExtractionFailed(
                "mock extraction engine not initialized".into(),
            ));
        }
        Ok(self.text.clone())
    }
}
