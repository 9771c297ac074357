//! In-process engine that answers a handful of JSON-RPC methods from the chain specification.
//!
//! It performs no networking and no block verification. It exists so that the client layer can
//! be exercised end to end (tests, the `chainhost` CLI) with the same relay chain matching,
//! queue back-pressure and teardown behaviour a real engine exposes.

use super::chain_spec::ChainSpec;
use super::responder::{answer, ResponderContext};
use super::{CreateChainRequest, Engine, EngineError};
use crate::log_sink::Logger;
use crate::types::ChainId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex as AsyncMutex;

const LOG_TARGET: &str = "chainhost::loopback";
const DEFAULT_MAX_PENDING_RESPONSES: usize = 128;
const DEFAULT_NODE_NAME: &str = "chainhost-loopback";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoopbackConfig {
    /// Responses buffered per chain before `submit_request` reports a full queue.
    #[serde(default = "default_max_pending_responses")]
    pub max_pending_responses: usize,
    /// Returned by `system_name`.
    #[serde(default = "default_node_name")]
    pub node_name: String,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            max_pending_responses: DEFAULT_MAX_PENDING_RESPONSES,
            node_name: DEFAULT_NODE_NAME.to_owned(),
        }
    }
}

impl LoopbackConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

fn default_max_pending_responses() -> usize {
    DEFAULT_MAX_PENDING_RESPONSES
}

fn default_node_name() -> String {
    DEFAULT_NODE_NAME.to_owned()
}

struct ResponseQueue {
    sender: mpsc::Sender<String>,
    receiver: Arc<AsyncMutex<mpsc::Receiver<String>>>,
}

impl ResponseQueue {
    fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self { sender, receiver: Arc::new(AsyncMutex::new(receiver)) }
    }
}

struct LoopbackChain {
    spec: ChainSpec,
    database_content: String,
    relay: Option<ChainId>,
    /// `None` when JSON-RPC is disabled or the user already destroyed the chain.
    responses: Option<ResponseQueue>,
    removed_by_user: bool,
    /// Parachains still referencing this chain as their relay chain.
    dependents: usize,
}

impl LoopbackChain {
    fn visible(&self) -> bool {
        !self.removed_by_user
    }
}

enum EngineStatus {
    Running,
    ShuttingDown,
    Crashed(String),
}

struct Inner {
    status: EngineStatus,
    next_id: u32,
    chains: HashMap<ChainId, LoopbackChain>,
}

impl Inner {
    fn ensure_running(&self) -> Result<(), EngineError> {
        match &self.status {
            EngineStatus::Running => Ok(()),
            EngineStatus::ShuttingDown => Err(EngineError::ShuttingDown),
            EngineStatus::Crashed(message) => Err(EngineError::Crashed(message.clone())),
        }
    }

    fn visible_chain(&self, id: ChainId) -> Result<&LoopbackChain, EngineError> {
        self.chains.get(&id).filter(|chain| chain.visible()).ok_or(EngineError::ChainNotFound)
    }

    fn allocate_id(&mut self) -> ChainId {
        loop {
            let id = ChainId(self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            if !self.chains.contains_key(&id) {
                return id;
            }
        }
    }

    fn find_relay_chain(&self, relay_id: &str, candidates: &[ChainId]) -> Result<ChainId, EngineError> {
        let candidates = candidates.iter().copied().collect::<BTreeSet<_>>();
        let matching = candidates
            .into_iter()
            .filter(|id| {
                self.chains
                    .get(id)
                    .map_or(false, |chain| chain.visible() && chain.spec.id == relay_id)
            })
            .collect::<Vec<_>>();
        match matching.as_slice() {
            [] => Err(EngineError::Rejected(format!(
                "couldn't find relevant relay chain '{relay_id}' among the potential relay chains"
            ))),
            [single] => Ok(*single),
            _ => Err(EngineError::Rejected(format!(
                "multiple potential relay chains match '{relay_id}'"
            ))),
        }
    }

    /// Drops `id` and every relay chain that was only kept alive by it.
    fn release(&mut self, id: ChainId) -> usize {
        let mut released = 0;
        let mut next = Some(id);
        while let Some(current) = next.take() {
            let Some(chain) = self.chains.remove(&current) else {
                break;
            };
            released += 1;
            if let Some(relay) = chain.relay {
                if let Some(parent) = self.chains.get_mut(&relay) {
                    parent.dependents = parent.dependents.saturating_sub(1);
                    if parent.removed_by_user && parent.dependents == 0 {
                        next = Some(relay);
                    }
                }
            }
        }
        released
    }
}

pub struct LoopbackEngine {
    config: LoopbackConfig,
    logger: Logger,
    inner: Mutex<Inner>,
}

impl LoopbackEngine {
    pub fn new(config: LoopbackConfig, logger: Logger) -> Self {
        Self {
            config,
            logger,
            inner: Mutex::new(Inner {
                status: EngineStatus::Running,
                next_id: 0,
                chains: HashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &LoopbackConfig {
        &self.config
    }

    /// Puts the engine in an unrecoverable state: every later call fails with
    /// [`EngineError::Crashed`] and every chain is dropped.
    pub fn simulate_crash(&self, message: impl Into<String>) {
        let message = message.into();
        let mut inner = self.inner.lock().expect("loopback engine mutex poisoned");
        inner.chains.clear();
        self.logger.error(LOG_TARGET, format_args!("engine crashed: {message}"));
        inner.status = EngineStatus::Crashed(message);
    }

    /// Number of chains held internally, including relay chains kept alive for parachains.
    pub fn chain_count(&self) -> usize {
        self.inner.lock().expect("loopback engine mutex poisoned").chains.len()
    }

    pub fn is_alive(&self, id: ChainId) -> bool {
        self.inner.lock().expect("loopback engine mutex poisoned").chains.contains_key(&id)
    }

    pub fn relay_chain_of(&self, id: ChainId) -> Option<ChainId> {
        self.inner
            .lock()
            .expect("loopback engine mutex poisoned")
            .chains
            .get(&id)
            .and_then(|chain| chain.relay)
    }
}

#[async_trait]
impl Engine for LoopbackEngine {
    async fn create_chain(&self, request: CreateChainRequest) -> Result<ChainId, EngineError> {
        let mut inner = self.inner.lock().expect("loopback engine mutex poisoned");
        inner.ensure_running()?;

        let spec = ChainSpec::from_json(&request.chain_spec).map_err(EngineError::Rejected)?;
        let relay = match spec.relay_chain() {
            Some(relay_id) => Some(inner.find_relay_chain(relay_id, &request.relay_chains)?),
            None => None,
        };
        if let Some(relay) = relay {
            if let Some(parent) = inner.chains.get_mut(&relay) {
                parent.dependents += 1;
            }
        }

        let id = inner.allocate_id();
        let responses = if request.disable_json_rpc {
            None
        } else {
            Some(ResponseQueue::new(self.config.max_pending_responses))
        };
        self.logger.info(
            LOG_TARGET,
            format_args!(
                "chain {id} added: {} ({}){}",
                spec.name,
                spec.id,
                relay.map(|relay| format!(", relay chain {relay}")).unwrap_or_default()
            ),
        );
        if !request.database_content.is_empty() {
            self.logger.debug(
                LOG_TARGET,
                format_args!(
                    "chain {id}: restored {} bytes of database",
                    request.database_content.len()
                ),
            );
        }
        inner.chains.insert(
            id,
            LoopbackChain {
                spec,
                database_content: request.database_content,
                relay,
                responses,
                removed_by_user: false,
                dependents: 0,
            },
        );
        Ok(id)
    }

    fn destroy_chain(&self, id: ChainId) {
        let mut inner = self.inner.lock().expect("loopback engine mutex poisoned");
        let Some(chain) = inner.chains.get_mut(&id) else {
            self.logger.debug(LOG_TARGET, format_args!("destroy of unknown chain {id} ignored"));
            return;
        };
        if chain.removed_by_user {
            return;
        }
        chain.removed_by_user = true;
        chain.responses = None;
        if chain.dependents > 0 {
            self.logger.debug(
                LOG_TARGET,
                format_args!("chain {id} kept alive for {} parachain(s)", chain.dependents),
            );
            return;
        }
        let released = inner.release(id);
        self.logger.info(LOG_TARGET, format_args!("chain {id} removed ({released} released)"));
    }

    fn submit_request(&self, id: ChainId, request: String) -> Result<(), EngineError> {
        let inner = self.inner.lock().expect("loopback engine mutex poisoned");
        inner.ensure_running()?;
        let chain = inner.visible_chain(id)?;
        let queue = chain.responses.as_ref().ok_or(EngineError::JsonRpcDisabled)?;

        let ctx = ResponderContext {
            node_name: &self.config.node_name,
            spec: &chain.spec,
            database_content: &chain.database_content,
        };
        let Some(response) = answer(&ctx, &request).map_err(EngineError::Malformed)? else {
            return Ok(());
        };
        self.logger.trace(LOG_TARGET, format_args!("chain {id}: {request} => {response}"));
        queue.sender.try_send(response).map_err(|err| match err {
            TrySendError::Full(_) => EngineError::QueueFull,
            TrySendError::Closed(_) => EngineError::ChainNotFound,
        })
    }

    async fn pull_response(&self, id: ChainId) -> Result<String, EngineError> {
        let receiver = {
            let inner = self.inner.lock().expect("loopback engine mutex poisoned");
            inner.ensure_running()?;
            let chain = inner.visible_chain(id)?;
            let queue = chain.responses.as_ref().ok_or(EngineError::JsonRpcDisabled)?;
            Arc::clone(&queue.receiver)
        };

        let next = receiver.lock().await.recv().await;
        match next {
            Some(response) => Ok(response),
            None => {
                let inner = self.inner.lock().expect("loopback engine mutex poisoned");
                inner.ensure_running()?;
                Err(EngineError::ChainNotFound)
            }
        }
    }

    fn begin_shutdown(&self) {
        let mut inner = self.inner.lock().expect("loopback engine mutex poisoned");
        if !matches!(inner.status, EngineStatus::Running) {
            return;
        }
        inner.status = EngineStatus::ShuttingDown;
        let count = inner.chains.len();
        inner.chains.clear();
        self.logger.info(LOG_TARGET, format_args!("shutting down, {count} chain(s) dropped"));
    }
}
