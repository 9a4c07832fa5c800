//! HTTP module for making API requests to model providers
//!
//! This module implements the shared transport layer, handling:
//! - Connection pooling and client management
//! - Per-call timeouts and caller-supplied cancellation
//! - Error mapping into failure results
//! - Request ID generation and correlation

pub mod client;
pub mod error;

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Options for a single provider call
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Upper bound on the whole call, body read included
    pub timeout: Duration,

    /// Caller-supplied abort signal
    pub cancellation: Option<CancellationToken>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timeout: DEFAULT_TIMEOUT,
            cancellation: None,
        }
    }
}

impl CallOptions {
    /// Create new call options with a generated request ID
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout for this call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Abort the call when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Same settings with a fresh request ID
    pub fn renewed(&self) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            ..self.clone()
        }
    }
}
