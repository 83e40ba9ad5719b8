//! # sp-llm
//!
//! A uniform adapter over three LLM provider families.
//!
//! The coordinator and specialists speak one canonical shape
//! ([`ChatRequest`] in, [`LlmResponse`] or a [`StreamEvent`] stream out).
//! Three codecs translate that shape to and from provider wire formats:
//! native tool use ([`native`]), function calls ([`function_call`]), and
//! typed function calls ([`typed_function`]). The codecs never open a
//! socket; HTTP lives behind the injected [`ProviderTransport`].
//!
//! Provider failures surface as [`LlmError`] variants and are not retried
//! here; the agent loop owns retry policy.

pub mod adapter;
pub mod error;
pub mod function_call;
pub mod native;
pub mod transport;
pub mod typed_function;
pub mod types;

pub use adapter::LlmAdapter;
pub use error::LlmError;
pub use function_call::FunctionCallAdapter;
pub use native::NativeToolAdapter;
pub use transport::ProviderTransport;
pub use typed_function::TypedFunctionAdapter;
pub use types::{
    ChatMessage, ChatRequest, ContentBlock, LlmResponse, Role, StreamEvent, TokenUsage,
    ToolSpec, ToolUseBlock,
};
