use crate::error::ClientError;
use crate::types::{ChainId, ChainToken};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Maps live chain handles to engine chain ids.
///
/// A token is resolvable from `register` until `unregister_with` (or `clear`). Lookups of
/// removed, foreign or never-issued tokens all report absence.
#[derive(Debug)]
pub struct ChainRegistry {
    client_nonce: u64,
    next_serial: AtomicU64,
    entries: Mutex<HashMap<ChainToken, ChainId>>,
}

impl ChainRegistry {
    pub fn new(client_nonce: u64) -> Self {
        Self {
            client_nonce,
            next_serial: AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a token that has never been handed out by this registry.
    pub fn mint(&self) -> ChainToken {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        ChainToken::new(self.client_nonce, serial)
    }

    pub fn register(&self, token: ChainToken, id: ChainId) -> Result<(), ClientError> {
        if token.client() != self.client_nonce {
            return Err(ClientError::internal(format!(
                "token {token} was not minted by this client"
            )));
        }
        let mut entries = self.entries.lock().expect("chain registry mutex poisoned");
        match entries.get(&token) {
            Some(existing) if *existing != id => Err(ClientError::internal(format!(
                "token {token} already registered to chain {existing}"
            ))),
            Some(_) => Ok(()),
            None => {
                entries.insert(token, id);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, token: ChainToken) -> Option<ChainId> {
        if token.client() != self.client_nonce {
            return None;
        }
        self.entries.lock().expect("chain registry mutex poisoned").get(&token).copied()
    }

    /// Runs `guard` and, if it succeeds, removes the entry, both while holding the registry
    /// lock. Resolvers therefore never observe a token whose removal has already been decided.
    pub fn unregister_with<F>(&self, token: ChainToken, guard: F) -> Result<Option<ChainId>, ClientError>
    where
        F: FnOnce() -> Result<(), ClientError>,
    {
        let mut entries = self.entries.lock().expect("chain registry mutex poisoned");
        guard()?;
        Ok(entries.remove(&token))
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock().expect("chain registry mutex poisoned");
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("chain registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
