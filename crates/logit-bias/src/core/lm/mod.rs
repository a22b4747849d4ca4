pub mod chat;
pub mod config;
pub mod provider;
pub mod request;
pub mod usage;

pub use chat::*;
pub use config::*;
pub use provider::*;
pub use request::*;
pub use usage::*;

use bon::Builder;
use tracing::debug;

use crate::core::LmError;
use crate::providers::{ConcreteProvider, OpenAIProvider};

/// A single completion returned by [`LM::call`].
#[derive(Clone, Debug)]
pub struct LMResponse {
    /// Assistant message chosen by the provider.
    pub output: Message,
    /// Token usage reported by the provider for this call.
    pub usage: LmUsage,
    /// Chat history including the freshly appended assistant response.
    pub chat: Chat,
    pub finish_reason: Option<String>,
}

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

fn get_base_url_by_provider(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some(OPENAI_BASE_URL),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "openrouter" => Some(OPENROUTER_BASE_URL),
        "together" => Some("https://api.together.xyz/v1"),
        "xai" => Some("https://api.x.ai/v1"),
        "qwen" => Some("https://dashscope-intl.aliyuncs.com/compatible-mode/v1"),
        _ => None,
    }
}

/// Chat-completion client pairing a provider with default request settings.
///
/// Clones share the provider's HTTP client. The settings held here are only
/// read by [`call`](Self::call); use [`call_with`](Self::call_with) to send
/// caller-owned settings instead.
#[derive(Clone, Builder)]
pub struct LM {
    #[builder(into)]
    provider: ConcreteProvider,
    #[builder(default)]
    settings: RequestSettings,
}

impl LM {
    pub fn provider(&self) -> &ConcreteProvider {
        &self.provider
    }

    pub fn settings(&self) -> &RequestSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RequestSettings {
        &mut self.settings
    }

    /// Sends `chat` with this client's own settings.
    pub async fn call(&self, chat: Chat) -> Result<LMResponse, LmError> {
        self.call_with(chat, &self.settings).await
    }

    /// Sends `chat` with `settings`, which are borrowed and left unchanged.
    #[tracing::instrument(
        name = "logit_bias.lm.call",
        level = "debug",
        skip(self, chat, settings),
        fields(
            model = %settings.model,
            messages = chat.len(),
            biased_tokens = settings.logit_bias.len()
        )
    )]
    pub async fn call_with(
        &self,
        chat: Chat,
        settings: &RequestSettings,
    ) -> Result<LMResponse, LmError> {
        let request = settings.to_request(&chat);
        let response = self.provider.complete(&request).await?;

        let Some(choice) = response.choices.into_iter().next() else {
            return Err(LmError::provider(
                self.provider.name(),
                "response contained no choices",
            ));
        };
        let usage = response.usage.unwrap_or_default();
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            finish_reason = ?choice.finish_reason,
            "completion received"
        );

        let mut full_chat = chat;
        full_chat.push_message(choice.message.clone());

        Ok(LMResponse {
            output: choice.message,
            usage,
            chat: full_chat,
            finish_reason: choice.finish_reason,
        })
    }
}

/// Builds an [`LM`] for an OpenAI-compatible endpoint.
///
/// `model` may carry a known `provider/` prefix (`groq/llama-3.1-8b-instant`),
/// which selects the base URL and is stripped from the model name. Any other
/// `vendor/model` slug is sent whole to OpenRouter, which routes on it.
pub fn openai_lm(api_key: impl Into<String>, model: &str) -> LM {
    let (base_url, model_name) = match model.split_once('/') {
        Some((provider, model_name)) => match get_base_url_by_provider(provider) {
            Some(base_url) => (base_url, model_name),
            None => (OPENROUTER_BASE_URL, model),
        },
        None => (OPENAI_BASE_URL, model),
    };
    let provider = OpenAIProvider::new(api_key, Some(base_url.to_string()));
    let settings = RequestSettings::builder().model(model_name).build();

    LM::builder().provider(provider).settings(settings).build()
}
