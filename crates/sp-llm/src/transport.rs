// transport.rs — The ProviderTransport capability.
//
// Codecs build provider-shaped JSON bodies; something else moves them
// over the wire. The HTTP client (and its auth headers, retries at the
// connection level, and base URLs) lives with the service layer; tests
// inject scripted transports.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::error::LlmError;

/// Moves provider-shaped JSON to and from the provider.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// Send one request body, returning the provider's response body.
    async fn send(&self, body: Value) -> Result<Value, LlmError>;

    /// Send one request body in streaming mode, returning the provider's
    /// event objects in arrival order.
    async fn stream(&self, body: Value) -> Result<BoxStream<'static, Result<Value, LlmError>>, LlmError>;
}
