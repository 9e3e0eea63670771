use crate::error::{AdvisorError, Result};
use crate::llm::config::GeminiConfig;
use crate::llm::types::*;
use futures::stream::{BoxStream, StreamExt};
use log::debug;
use reqwest::Client;

pub type ByteStream = BoxStream<'static, std::result::Result<Vec<u8>, reqwest::Error>>;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Fails with a configuration error when `config` carries no usable key.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config.credential().ok_or_else(|| {
            AdvisorError::Configuration("GEMINI_API_KEY is not set".to_string())
        })?;

        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Opens a streaming generation and returns the raw SSE body.
    pub async fn stream_generate_content(
        &self,
        system_instruction: &Content,
        contents: Vec<&Content>,
    ) -> Result<ByteStream> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );

        let payload = GenerateContentRequest {
            contents,
            system_instruction,
        };
        debug!(
            "Streaming {} turns to {}",
            payload.contents.len(),
            self.model
        );

        // The key travels in a header, and errors drop the URL before they surface.
        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await.map_err(reqwest::Error::without_url)?;
            let detail = serde_json::from_str::<ApiErrorBody>(&err_text)
                .map(|body| body.error.message)
                .unwrap_or(err_text);
            return Err(AdvisorError::Request(format!(
                "Gemini API Error (status {}): {}",
                status, detail
            )));
        }

        Ok(res
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(reqwest::Error::without_url)
            })
            .boxed())
    }
}
