//! OpenAI provider implementation
//!
//! This module provides an adapter for OpenAI-style chat completion APIs,
//! translating resolved prompts into the `/chat/completions` wire format.

mod client;
pub mod types;

pub use client::{OpenAIAdapter, OPENAI_BASE_URL};
pub use types::{OpenAIRequest, OpenAIResponse};
