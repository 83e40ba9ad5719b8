// adapter.rs — The LlmAdapter trait.
//
// One trait, three codec implementations. The default streaming
// implementation degrades to a single text event followed by the terminal
// response; codecs with real incremental streaming override it.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::LlmError;
use crate::types::{ChatRequest, LlmResponse, StreamEvent};

/// Uniform interface over the provider families.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// One blocking model call.
    async fn create_message(&self, request: &ChatRequest) -> Result<LlmResponse, LlmError>;

    /// Streaming model call. Yields zero or more `Text` chunks followed
    /// by exactly one terminal `Response`, which is always last and
    /// carries the authoritative full content.
    async fn stream_message(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent, LlmError>>, LlmError> {
        let response = self.create_message(request).await?;
        let text = response.text();
        let stream = futures::stream::iter(
            std::iter::once(Ok(StreamEvent::Text(text)))
                .chain(std::iter::once(Ok(StreamEvent::Response(response)))),
        );
        Ok(stream.boxed())
    }
}
