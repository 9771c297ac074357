use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod code {
    pub const ADD_CHAIN: &str = "CHAINHOST_ADD_CHAIN";
    pub const ALREADY_DESTROYED: &str = "CHAINHOST_ALREADY_DESTROYED";
    pub const JSON_RPC_DISABLED: &str = "CHAINHOST_JSON_RPC_DISABLED";
    pub const MALFORMED_JSON_RPC: &str = "CHAINHOST_MALFORMED_JSON_RPC";
    pub const QUEUE_FULL: &str = "CHAINHOST_QUEUE_FULL";
    pub const CRASH: &str = "CHAINHOST_CRASH";
    pub const INTERNAL: &str = "CHAINHOST_INTERNAL_ERROR";
}

/// Which handle reached its terminal state.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DestroyedResource {
    Client,
    Chain,
}

impl DestroyedResource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Chain => "chain",
        }
    }
}

impl fmt::Display for DestroyedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the client and chain handles.
///
/// Every variant is a distinct kind so callers can branch with `matches!` instead of
/// inspecting messages.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The engine refused to create the chain, or the options were structurally invalid.
    #[error("failed to add chain: {message}")]
    AddChain { message: String },

    /// The client or the chain has already been terminated.
    #[error("{resource} has already been destroyed")]
    AlreadyDestroyed { resource: DestroyedResource },

    /// The chain was created with JSON-RPC disabled.
    #[error("JSON-RPC has been disabled for this chain")]
    JsonRpcDisabled,

    /// The request is not valid JSON-RPC or is too large to be forwarded.
    #[error("malformed JSON-RPC request: {reason}")]
    MalformedJsonRpc { reason: String },

    /// The chain's response queue is saturated.
    #[error("JSON-RPC response queue is full")]
    QueueFull,

    /// The engine failed irrecoverably.
    #[error("engine crashed: {message}")]
    Crash { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ClientError {
    pub fn add_chain(message: impl Into<String>) -> Self {
        Self::AddChain { message: message.into() }
    }

    pub fn client_destroyed() -> Self {
        Self::AlreadyDestroyed { resource: DestroyedResource::Client }
    }

    pub fn chain_removed() -> Self {
        Self::AlreadyDestroyed { resource: DestroyedResource::Chain }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedJsonRpc { reason: reason.into() }
    }

    pub fn crash(message: impl Into<String>) -> Self {
        Self::Crash { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::AddChain { .. } => code::ADD_CHAIN,
            Self::AlreadyDestroyed { .. } => code::ALREADY_DESTROYED,
            Self::JsonRpcDisabled => code::JSON_RPC_DISABLED,
            Self::MalformedJsonRpc { .. } => code::MALFORMED_JSON_RPC,
            Self::QueueFull => code::QUEUE_FULL,
            Self::Crash { .. } => code::CRASH,
            Self::Internal { .. } => code::INTERNAL,
        }
    }

    /// Returns `true` when the error means the whole client is unusable.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AlreadyDestroyed { resource: DestroyedResource::Client } | Self::Crash { .. }
        )
    }

    /// Returns `true` for errors that may go away if the caller retries later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::QueueFull)
    }
}
