//! Boundary with the engine that runs the chains.
//!
//! The client never inspects chain specifications or JSON-RPC payloads itself. Everything it
//! needs from the engine is captured by [`Engine`]; the engine owns chain deduplication, relay
//! chain matching and the parent/child graph between relay chains and parachains.

#[cfg(feature = "loopback")]
pub mod chain_spec;
#[cfg(feature = "loopback")]
pub mod loopback;
#[cfg(feature = "loopback")]
mod responder;

use crate::types::ChainId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything the engine needs to create a chain.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateChainRequest {
    pub chain_spec: String,
    /// Opaque database content from a previous run. Empty when the caller has none.
    pub database_content: String,
    /// Candidate relay chains, already resolved to live ids.
    pub relay_chains: Vec<ChainId>,
    pub disable_json_rpc: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Chain creation refused, with a human readable reason.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("response queue full")]
    QueueFull,

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("JSON-RPC disabled")]
    JsonRpcDisabled,

    #[error("chain not found")]
    ChainNotFound,

    #[error("engine is shutting down")]
    ShuttingDown,

    #[error("crashed: {0}")]
    Crashed(String),
}

/// The background engine shared by every chain of a client.
///
/// `destroy_chain`, `submit_request` and `begin_shutdown` must not block: they may schedule
/// work but return immediately. A saturated response queue is reported synchronously by
/// `submit_request` as [`EngineError::QueueFull`].
#[async_trait]
pub trait Engine: Send + Sync {
    async fn create_chain(&self, request: CreateChainRequest) -> Result<ChainId, EngineError>;

    fn destroy_chain(&self, id: ChainId);

    fn submit_request(&self, id: ChainId, request: String) -> Result<(), EngineError>;

    /// Waits for the next response or notification of `id`. Concurrent callers each receive a
    /// distinct item.
    async fn pull_response(&self, id: ChainId) -> Result<String, EngineError>;

    fn begin_shutdown(&self);
}

#[async_trait]
impl<T> Engine for std::sync::Arc<T>
where
    T: Engine + ?Sized,
{
    async fn create_chain(&self, request: CreateChainRequest) -> Result<ChainId, EngineError> {
        (**self).create_chain(request).await
    }

    fn destroy_chain(&self, id: ChainId) {
        (**self).destroy_chain(id)
    }

    fn submit_request(&self, id: ChainId, request: String) -> Result<(), EngineError> {
        (**self).submit_request(id, request)
    }

    async fn pull_response(&self, id: ChainId) -> Result<String, EngineError> {
        (**self).pull_response(id).await
    }

    fn begin_shutdown(&self) {
        (**self).begin_shutdown()
    }
}
