use crate::registry::ChainRegistry;
use crate::types::{ChainId, ChainToken};

/// Translates candidate relay chain tokens into engine ids, in order.
///
/// Tokens that no longer resolve (removed chains, chains of another client) are skipped: a
/// relay chain can be removed concurrently between the caller listing it and the new chain
/// being created. Deciding which candidate actually matches is left to the engine.
pub fn resolve_relay_chains(registry: &ChainRegistry, candidates: &[ChainToken]) -> Vec<ChainId> {
    candidates.iter().filter_map(|token| registry.lookup(*token)).collect()
}
