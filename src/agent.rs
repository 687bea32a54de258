//! Ollama client for text generation.
//!
//! Posts prompts to `/api/generate` with bounded retries and decodes the
//! streamed reply into plain text.

use crate::config::Config;
use crate::retry::{with_retry, RetryPolicy};
use crate::stream::{self, Framing};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("propsum/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("LLM request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("unexpected content type: {}", .0.as_deref().unwrap_or("<none>"))]
    UnexpectedContentType(Option<String>),
    #[error("failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Anything that turns a prompt into generated text.
#[async_trait]
pub trait Generator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Body of a `/api/generate` request
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Generator backed by an Ollama server.
pub struct OllamaClient {
    client: Client,
    url: String,
    model: String,
    stream: Option<bool>,
    retry: RetryPolicy,
}

impl OllamaClient {
    /// Build a client from the `[ollama]` and `[retry]` settings.
    pub fn new(config: &Config) -> Result<Self, GenerateError> {
        // per-read: a streamed generation may run longer than this in total
        let timeout = Duration::from_secs(config.ollama.timeout_secs);
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.generate_url(),
            model: config.ollama.model.clone(),
            stream: config.ollama.stream,
            retry: config.retry_policy(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post(&self, prompt: &str) -> Result<Response, reqwest::Error> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: self.stream,
        };
        self.client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "generating");
        let response = with_retry(&self.retry, || self.post(prompt)).await?;
        read_generation(response).await
    }
}

/// Decode a successful response according to its declared framing.
pub async fn read_generation(response: Response) -> Result<String, GenerateError> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match content_type.as_deref().and_then(Framing::from_content_type) {
        Some(Framing::Ndjson) => Ok(stream::collect_ndjson(response.bytes_stream()).await?),
        Some(Framing::Json) => Ok(stream::parse_json(&response.bytes().await?)?),
        None => {
            error!(
                "Unexpected content type: {}",
                content_type.as_deref().unwrap_or("<none>")
            );
            Err(GenerateError::UnexpectedContentType(content_type))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_omits_unset_stream_flag() {
        let body = serde_json::to_value(GenerateRequest {
            model: "gemma2:2b",
            prompt: "Hi",
            stream: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"model": "gemma2:2b", "prompt": "Hi"}));

        let body = serde_json::to_value(GenerateRequest {
            model: "gemma2:2b",
            prompt: "Hi",
            stream: Some(false),
        })
        .unwrap();
        assert_eq!(body["stream"], serde_json::json!(false));
    }

    #[test]
    fn client_targets_generate_endpoint() {
        let client = OllamaClient::new(&Config::default()).unwrap();
        assert_eq!(client.url, "http://localhost:11434/api/generate");
        assert_eq!(client.model(), "gemma2:2b");
        assert_eq!(client.retry.max_attempts(), 3);
    }

    #[test]
    fn unexpected_content_type_message() {
        let err = GenerateError::UnexpectedContentType(Some("text/html".to_string()));
        assert_eq!(err.to_string(), "unexpected content type: text/html");
        let err = GenerateError::UnexpectedContentType(None);
        assert_eq!(err.to_string(), "unexpected content type: <none>");
    }
}
