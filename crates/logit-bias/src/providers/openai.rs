use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::core::{
    ChatCompletionRequest, ChatCompletionResponse, CompletionProvider, LmError, OPENAI_BASE_URL,
};
use crate::utils::truncate;

const PROVIDER_NAME: &str = "openai";

/// Sends requests to an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    timeout: Option<Duration>,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        OpenAIProvider {
            client: reqwest::Client::new(),
            api_key: SecretString::from(api_key.into()),
            base_url: base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            timeout: None,
        }
    }

    /// Bounds every request, including reading the response body.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    #[tracing::instrument(
        name = "logit_bias.provider.openai.complete",
        level = "debug",
        skip(self, request),
        fields(model = %request.model, biased_tokens = request.logit_bias.len())
    )]
    async fn send(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LmError> {
        let endpoint = self.endpoint();
        let mut builder = self
            .client
            .post(&endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| self.transport_error(&endpoint, source))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            warn!(?retry_after, "rate limited by provider");
            return Err(LmError::RateLimit { retry_after });
        }
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => {
                    warn!(
                        status = status.as_u16(),
                        %error,
                        "failed to read rejected response body"
                    );
                    String::new()
                }
            };
            warn!(
                status = status.as_u16(),
                body = truncate(&body, 200),
                "completion request rejected"
            );
            return Err(LmError::InvalidResponse {
                status: status.as_u16(),
                body,
            });
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    self.transport_error(&endpoint, source)
                } else {
                    LmError::Provider {
                        provider: PROVIDER_NAME.to_string(),
                        message: "could not decode completion response".to_string(),
                        source: Some(Box::new(source)),
                    }
                }
            })?;
        debug!(choices = completion.choices.len(), "completion decoded");
        Ok(completion)
    }

    fn transport_error(&self, endpoint: &str, source: reqwest::Error) -> LmError {
        if source.is_timeout() {
            LmError::Timeout {
                after: self.timeout.unwrap_or_default(),
            }
        } else {
            LmError::Network {
                endpoint: endpoint.to_string(),
                source,
            }
        }
    }
}

impl CompletionProvider for OpenAIProvider {
    fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> impl Future<Output = Result<ChatCompletionResponse, LmError>> + Send {
        self.send(request)
    }
}
