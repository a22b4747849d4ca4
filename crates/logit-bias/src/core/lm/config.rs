use bon::Builder;
use serde::{Deserialize, Serialize};

use super::{Chat, ChatCompletionRequest};
use crate::core::{BiasError, BiasMap};

/// Generation parameters for a chat completion, plus the token bias map.
///
/// A `RequestSettings` is owned by the caller building a request and can be
/// reused verbatim across many requests. Sending a request only reads it:
/// [`to_request`](Self::to_request) takes a fresh snapshot of the bias map,
/// so later edits affect later requests only.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestSettings {
    /// Model identifier sent in the `model` field.
    #[builder(default = "gpt-4o-mini".to_string(), into)]
    pub model: String,
    /// Maximum tokens requested for the completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature. Higher values increase randomness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling threshold (`top_p`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    /// Deterministic seed when the provider supports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Number of completions to request per prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u8>,
    /// Sequences at which the provider stops generating.
    #[builder(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    /// End-user tag forwarded for provider-side abuse monitoring.
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Token-level logit adjustments keyed by tokenizer ids.
    #[builder(default)]
    #[serde(skip_serializing_if = "BiasMap::is_empty")]
    pub logit_bias: BiasMap,
}

impl Default for RequestSettings {
    fn default() -> Self {
        RequestSettings::builder().build()
    }
}

impl RequestSettings {
    pub fn logit_bias(&self) -> &BiasMap {
        &self.logit_bias
    }

    pub fn logit_bias_mut(&mut self) -> &mut BiasMap {
        &mut self.logit_bias
    }

    pub fn set_logit_bias(&mut self, token_id: u32, bias: i32) -> Result<(), BiasError> {
        self.logit_bias.set(token_id, bias)
    }

    pub fn remove_logit_bias(&mut self, token_id: u32) -> Option<i32> {
        self.logit_bias.remove(token_id)
    }

    /// Merges these settings and `chat` into an outbound request body.
    pub fn to_request(&self, chat: &Chat) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: chat.messages.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            presence_penalty: self.presence_penalty,
            frequency_penalty: self.frequency_penalty,
            seed: self.seed,
            n: self.n,
            stop: self.stop.clone(),
            logit_bias: self.logit_bias.to_payload(),
            user: self.user.clone(),
        }
    }
}
