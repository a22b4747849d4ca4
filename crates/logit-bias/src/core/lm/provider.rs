use super::{ChatCompletionRequest, ChatCompletionResponse};
use crate::core::LmError;

/// Transport that delivers a finished request body to a completion endpoint.
///
/// Implementations receive the request by reference and must not alter the
/// settings it was built from.
pub trait CompletionProvider {
    fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> impl Future<Output = Result<ChatCompletionResponse, LmError>> + Send;
}
