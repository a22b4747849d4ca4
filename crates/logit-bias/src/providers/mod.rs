pub mod dummy;
pub mod openai;

pub use dummy::*;
pub use openai::*;

use crate::core::{ChatCompletionRequest, ChatCompletionResponse, CompletionProvider, LmError};

#[derive(Clone, Debug)]
pub enum ConcreteProvider {
    Dummy(DummyProvider),
    OpenAI(OpenAIProvider),
}

impl ConcreteProvider {
    pub fn name(&self) -> &'static str {
        match self {
            ConcreteProvider::Dummy(_) => "dummy",
            ConcreteProvider::OpenAI(_) => "openai",
        }
    }
}

impl CompletionProvider for ConcreteProvider {
    fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> impl Future<Output = Result<ChatCompletionResponse, LmError>> + Send {
        async move {
            match self {
                ConcreteProvider::Dummy(provider) => provider.complete(request).await,
                ConcreteProvider::OpenAI(provider) => provider.complete(request).await,
            }
        }
    }
}

impl From<DummyProvider> for ConcreteProvider {
    fn from(provider: DummyProvider) -> Self {
        ConcreteProvider::Dummy(provider)
    }
}

impl From<OpenAIProvider> for ConcreteProvider {
    fn from(provider: OpenAIProvider) -> Self {
        ConcreteProvider::OpenAI(provider)
    }
}
