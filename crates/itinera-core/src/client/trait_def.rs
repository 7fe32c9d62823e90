//! The `ModelClient` trait -- the adapter interface for generation backends.
//!
//! Each concrete backend (OpenAI-compatible HTTP, test fakes) implements
//! this trait. It is object-safe so the invoker can work with
//! `&dyn ModelClient` and the pipeline can hold an `Arc<dyn ModelClient>`.

use async_trait::async_trait;

use super::types::{AttemptError, Completion, CompletionRequest};

/// Adapter interface for a remote text-generation service.
///
/// One call to [`ModelClient::complete`] is one attempt against one
/// candidate model. Implementations must not retry internally: the
/// invoker's ordered candidate list is the retry strategy.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Human-readable name for this backend (e.g. "openai").
    fn name(&self) -> &str;

    /// Issue a single generation request.
    ///
    /// Implementations map their failures onto [`AttemptError`]. Returning
    /// `Ok` with blank text is allowed; the invoker treats it as
    /// [`AttemptError::EmptyResponse`].
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AttemptError>;
}

// Compile-time assertion: ModelClient must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ModelClient) {}
};
