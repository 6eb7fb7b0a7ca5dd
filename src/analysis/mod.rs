//! Remote STRIDE analysis.
//!
//! The requester never fails past its boundary: every service or transport
//! problem comes back as a human-readable string.

pub mod api;
pub mod prompt;

use async_trait::async_trait;

use crate::config::ExtensionConfig;
use crate::results::PageSnapshot;
use crate::summarizer::summarize;
use api::{ApiMessage, ApiRequest, ApiResponse};

/// Returned when the service answers without a completion or error message
pub const NO_RESPONSE: &str = "No response.";

/// Returned when the service cannot be reached or answers with garbage
pub const TRANSPORT_FALLBACK: &str = "Error contacting analysis service.";

/// Returned when the prompt cannot be built
pub const ANALYSIS_FALLBACK: &str = "Error analyzing page security. Please try again.";

/// Produces a free-text STRIDE verdict for a page
#[async_trait]
pub trait SecurityAnalyzer: Send + Sync {
    async fn analyze(&self, snapshot: &PageSnapshot, screenshot: Option<&str>) -> String;
}

/// Chat-completion client for the analysis service
pub struct AnalysisClient {
    api_key: String,
    api_url: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl AnalysisClient {
    pub fn new(config: &ExtensionConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, messages: Vec<ApiMessage>) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        }
    }

    /// Send one completion request and extract its text
    pub async fn query(&self, messages: Vec<ApiMessage>) -> String {
        ::log::info!("Sending analysis request to {}", self.api_url);

        match self.send(&self.build_request(messages)).await {
            Ok(response) => response.text().unwrap_or_else(|| NO_RESPONSE.to_string()),
            Err(e) => {
                ::log::error!("Analysis service request failed: {}", e);
                TRANSPORT_FALLBACK.to_string()
            }
        }
    }

    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, reqwest::Error> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        // Error statuses still carry a JSON body with the service's message
        let body: ApiResponse = response.json().await?;
        ::log::debug!(
            "Analysis service answered {} with {} choices",
            status,
            body.choices.as_ref().map_or(0, Vec::len)
        );
        Ok(body)
    }
}

#[async_trait]
impl SecurityAnalyzer for AnalysisClient {
    async fn analyze(&self, snapshot: &PageSnapshot, screenshot: Option<&str>) -> String {
        let summary = summarize(snapshot);
        match prompt::build_messages(&summary, screenshot) {
            Ok(messages) => self.query(messages).await,
            Err(e) => {
                ::log::error!("Failed to build analysis prompt: {}", e);
                ANALYSIS_FALLBACK.to_string()
            }
        }
    }
}
