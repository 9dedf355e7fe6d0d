//! AI module for language model interactions.
//!
//! The client trait and its OpenAI-compatible implementation live in
//! [`client`]. The remaining modules are the call sites that do not belong
//! to a larger component: prompt construction, response parsing, inline
//! suggestions and natural-language translation.

pub mod client;
pub mod parser;
pub mod prompt;
pub mod suggest;
pub mod translate;

pub use client::{ChatRequest, LlmClient, OpenAiClient, TimeoutClient};
pub use suggest::{SuggestionEngine, SuggestionSlot};
pub use translate::translate;
