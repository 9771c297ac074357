use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Public operations, used to label log lines and guard failures.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Operation {
    AddChain,
    Terminate,
    SendJsonRpc,
    NextJsonRpcResponse,
    RemoveChain,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddChain => "add_chain",
            Self::Terminate => "terminate",
            Self::SendJsonRpc => "send_json_rpc",
            Self::NextJsonRpcResponse => "next_json_rpc_response",
            Self::RemoveChain => "remove_chain",
        }
    }
}

/// Write-once destroyed cell shared by a client and all of its chains.
///
/// Holds the error every later operation returns. Once set it is never cleared.
#[derive(Debug, Default)]
pub struct ClientLifecycle {
    destroyed: Mutex<Option<ClientError>>,
}

impl ClientLifecycle {
    pub fn check_live(&self) -> Result<(), ClientError> {
        match self.destroyed.lock().expect("client lifecycle mutex poisoned").as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.lock().expect("client lifecycle mutex poisoned").is_some()
    }

    /// Stores `error` as the terminal state. Fails with the previously stored error when the
    /// client was already destroyed.
    pub fn mark_destroyed(&self, error: ClientError) -> Result<(), ClientError> {
        let mut destroyed = self.destroyed.lock().expect("client lifecycle mutex poisoned");
        if let Some(existing) = destroyed.as_ref() {
            return Err(existing.clone());
        }
        *destroyed = Some(error);
        Ok(())
    }

    /// Records an engine crash. Returns the error callers should observe, which is the
    /// earlier terminal error if one was already stored.
    pub fn mark_crashed(&self, message: impl Into<String>) -> ClientError {
        let mut destroyed = self.destroyed.lock().expect("client lifecycle mutex poisoned");
        destroyed.get_or_insert_with(|| ClientError::crash(message)).clone()
    }
}

/// Monotonic removed flag of a single chain.
#[derive(Debug, Default)]
pub struct ChainLifecycle {
    removed: AtomicBool,
}

impl ChainLifecycle {
    pub fn check_live(&self) -> Result<(), ClientError> {
        if self.removed.load(Ordering::Acquire) {
            return Err(ClientError::chain_removed());
        }
        Ok(())
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Flips the flag. Exactly one caller wins; the others observe the chain as removed.
    pub fn mark_removed(&self) -> Result<(), ClientError> {
        self.removed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| ClientError::chain_removed())
    }
}
