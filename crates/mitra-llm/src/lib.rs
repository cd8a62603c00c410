//! LLM provider abstraction and prompt construction for answer-mitra.
//!
//! - [`TextGenerator`] — streaming text generation seam used by the server
//! - [`GeminiClient`] — Google Gemini implementation over server-sent events
//! - [`PromptTemplate`] / [`build_prompt`] — rubric prompt substitution

mod gemini;
pub mod prompt;

pub use gemini::GeminiClient;
pub use prompt::{build_prompt, PromptTemplate};

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use mitra_core::EvalError;

/// Stream of generated text pieces in arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, EvalError>> + Send>>;

/// A provider that turns a prompt into a stream of generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Starts generation. Errors before the first byte are returned directly;
    /// later failures arrive as `Err` items in the stream.
    async fn generate_stream(&self, prompt: &str) -> Result<TextStream, EvalError>;
}
