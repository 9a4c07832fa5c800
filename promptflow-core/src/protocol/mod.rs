//! Protocol module for the data exchanged with the execution engine
//!
//! This module defines the plain data structures passed between the
//! configuration layer, the resolver, the adapters and the executor.
//! These structures are designed to be:
//! - Provider-agnostic
//! - Serializable in the configuration document's camelCase shape
//! - Immutable from the engine's point of view

pub mod types;

pub use types::{
    CompletionFailure, CompletionResult, CompletionSuccess, ConnectionStatus, ErrorKind,
    FunctionDef, ModelDescriptor, ModelId, PromptData, PromptTemplate, ProviderId, TokenUsage,
    VariableContext, VariableValue,
};
