//! Promptflow Core Library
//!
//! This crate runs configurable prompt functions against LLM providers: it
//! resolves `{variable}` tokens in prompt templates, routes each call to the
//! provider serving the template's model and returns completions as data.
//!
//! ```no_run
//! use promptflow_core::{
//!     ConfigDocument, FunctionExecutor, PipelineRunner, ProviderDispatcher, ProviderSettings,
//!     VariableContext,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ProviderSettings::from_env()?;
//! let dispatcher = Arc::new(ProviderDispatcher::from_settings(&settings)?);
//! let runner = PipelineRunner::new(FunctionExecutor::new(dispatcher));
//!
//! let context = VariableContext::new()
//!     .with("grade", "5")
//!     .with("topic", "Ecosystems")
//!     .with("outcomes", "LS2-1");
//! let report = runner
//!     .run_document(&ConfigDocument::default_document(), context)
//!     .await;
//! println!("{:?}", report.halted_at);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod executor;
pub mod http;
pub mod pipeline;
pub mod protocol;
pub mod providers;
pub mod registry;
pub mod template;

pub use config::{ConfigDocument, ConfigError, ProviderSettings};
pub use executor::{ExecutionResult, FunctionExecutor};
pub use pipeline::{OutputBinding, PipelineReport, PipelineRunner};
pub use protocol::{
    CompletionFailure, CompletionResult, ErrorKind, FunctionDef, PromptData, PromptTemplate,
    VariableContext, VariableValue,
};
pub use providers::{ProviderAdapter, ProviderDispatcher};
pub use registry::ModelRegistry;

/// Returns the version of the Promptflow Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
