use std::sync::{Arc, Mutex, PoisonError};

use crate::core::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, CompletionProvider, LmError, LmUsage,
    Message,
};

fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// In-memory provider for deterministic tests and examples.
///
/// Answers every request with the same assistant reply and keeps a copy of
/// each request body it was handed. Usage figures count whitespace-separated
/// words, not real tokens.
#[derive(Clone, Debug)]
pub struct DummyProvider {
    reply: String,
    requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
}

impl Default for DummyProvider {
    fn default() -> Self {
        Self::new("dummy response")
    }
}

impl DummyProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Request bodies received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl CompletionProvider for DummyProvider {
    fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> impl Future<Output = Result<ChatCompletionResponse, LmError>> + Send {
        let seen = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(request.clone());
            requests.len()
        };

        let prompt_tokens = request
            .messages
            .iter()
            .map(|message| word_count(&message.content))
            .sum::<u32>();
        let completion_tokens = word_count(&self.reply);
        let response = ChatCompletionResponse {
            id: format!("dummy-{seen}"),
            model: request.model.clone(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(self.reply.clone()),
                finish_reason: Some("stop".to_string()),
            }],
            usage: Some(LmUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        };

        async move { Ok(response) }
    }
}
