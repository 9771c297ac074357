use crate::config::{ChainEntry, CliConfig};
use anyhow::{bail, Context};
use chainhost_client::engine::loopback::LoopbackEngine;
use chainhost_client::{AddChainOptions, Chain, ChainToken, Client, Engine, LogFacadeSink};
use std::fs;
use std::sync::Arc;

/// A chain added from a `[[chains]]` entry.
pub struct NamedChain<E: Engine> {
    pub name: String,
    pub chain: Chain<E>,
}

/// Builds a loopback-backed client whose engine and client share one logger.
pub fn loopback_client(config: &CliConfig) -> Client<LoopbackEngine> {
    let logger = config.client.logger(Arc::new(LogFacadeSink));
    let engine = LoopbackEngine::new(config.engine.clone(), logger.clone());
    Client::with_logger(engine, logger)
}

/// Adds every entry in order. Relay chain names refer to entries added before; names that
/// match nothing are skipped with a warning and left for the engine to judge.
pub async fn add_configured_chains<E: Engine>(
    client: &Client<E>,
    entries: &[ChainEntry],
) -> anyhow::Result<Vec<NamedChain<E>>> {
    let mut added: Vec<NamedChain<E>> = Vec::with_capacity(entries.len());
    for entry in entries {
        if added.iter().any(|existing| existing.name == entry.name) {
            bail!("chain '{}' is configured twice", entry.name);
        }
        let options = chain_options(entry, &added)?;
        let chain = client
            .add_chain(options)
            .await
            .with_context(|| format!("failed to add chain '{}'", entry.name))?;
        log::info!("chain '{}' added as {}", entry.name, chain.id());
        added.push(NamedChain { name: entry.name.clone(), chain });
    }
    Ok(added)
}

fn chain_options<E: Engine>(
    entry: &ChainEntry,
    added: &[NamedChain<E>],
) -> anyhow::Result<AddChainOptions> {
    let chain_spec = fs::read_to_string(&entry.spec)
        .with_context(|| format!("failed to read chain spec {}", entry.spec.display()))?;
    let relay_chains = entry
        .relay_chains
        .iter()
        .filter_map(|name| {
            let token = relay_token(name, added);
            if token.is_none() {
                log::warn!("chain '{}': unknown relay chain '{name}' ignored", entry.name);
            }
            token
        })
        .collect::<Vec<_>>();

    let mut options = AddChainOptions::new(chain_spec)
        .with_potential_relay_chains(relay_chains)
        .with_json_rpc_disabled(entry.disable_json_rpc);
    if let Some(path) = &entry.database {
        let database = fs::read_to_string(path)
            .with_context(|| format!("failed to read database {}", path.display()))?;
        options = options.with_database_content(database);
    }
    Ok(options)
}

fn relay_token<E: Engine>(name: &str, added: &[NamedChain<E>]) -> Option<ChainToken> {
    added.iter().find(|existing| existing.name == name).map(|existing| existing.chain.token())
}

/// The chain named `name`, or the last one when no name is given.
pub fn select_chain<'a, E: Engine>(
    chains: &'a [NamedChain<E>],
    name: Option<&str>,
) -> anyhow::Result<&'a NamedChain<E>> {
    let selected = match name {
        Some(name) => chains.iter().find(|named| named.name == name),
        None => chains.last(),
    };
    match (selected, name) {
        (Some(named), _) => Ok(named),
        (None, Some(name)) => bail!("no chain named '{name}' in the configuration"),
        (None, None) => bail!("the configuration declares no chains"),
    }
}
