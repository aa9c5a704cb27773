//! Answer Generator backed by an OpenAI-compatible chat-completion endpoint.

mod openai;

pub use openai::ChatCompletionClient;
