mod api;
pub mod json;
pub mod prompts;
mod provider;

pub use api::LlmApiClient;
pub use json::{extract_json, JsonShape};
pub use provider::{CompletionOptions, LlmBackend, LlmProvider, TextGenerator};
