//! Advisory chat for HydroSense.
//!
//! Turns the current water sample and conversation into a prompt, hands it to
//! an injected text-completion capability, and returns the reply. Provider
//! failures come back as values, never as panics.

pub mod completion;
pub mod error;
pub mod openai;
pub mod prompt;
pub mod responder;

pub use completion::{MockCompletion, TextCompletion};
pub use error::ProviderError;
pub use openai::ChatCompletionsClient;
pub use prompt::build_prompt;
pub use responder::{AdvisoryReply, AdvisoryResponder};
