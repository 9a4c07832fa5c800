//! Provider abstraction and dispatch
//!
//! This module implements the adapter layer that turns resolved prompts into
//! provider-specific wire calls, plus the dispatcher that picks an adapter for
//! a logical model id.

pub mod adapter;
pub mod anthropic;
pub mod dispatcher;
pub mod error;
pub mod openai;

pub use adapter::{ProviderAdapter, CONNECTION_TEST_MAX_TOKENS, MAX_COMPLETION_TOKENS};
pub use dispatcher::{DispatcherBuilder, ProviderDispatcher};
pub use error::{ProviderResult, ProviderSetupError};

// Re-export concrete adapters
pub use anthropic::AnthropicAdapter;
pub use openai::OpenAIAdapter;
