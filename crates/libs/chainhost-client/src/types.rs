use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the engine assigns to a chain it has created.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ChainId(pub u32);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque token identifying a chain handle.
///
/// Tokens carry the nonce of the client that minted them, so a token handed to another client
/// never resolves there. Tokens are never reused.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ChainToken {
    client: u64,
    serial: u64,
}

impl ChainToken {
    pub(crate) fn new(client: u64, serial: u64) -> Self {
        Self { client, serial }
    }

    pub(crate) fn client(self) -> u64 {
        self.client
    }
}

impl fmt::Display for ChainToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.client, self.serial)
    }
}
