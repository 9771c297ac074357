use crate::engine::{CreateChainRequest, Engine, EngineError};
use crate::error::ClientError;
use crate::lifecycle::{ChainLifecycle, ClientLifecycle, Operation};
use crate::log_sink::Logger;
use crate::options::AddChainOptions;
use crate::registry::ChainRegistry;
use crate::relay::resolve_relay_chains;
use crate::types::{ChainId, ChainToken};
use crate::{responses, router};
use serde_json::Value as JsonValue;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const LOG_TARGET: &str = "chainhost::client";

static NEXT_CLIENT_NONCE: AtomicU64 = AtomicU64::new(0);

/// State shared by a client and every chain it created.
pub(crate) struct Shared<E> {
    pub(crate) engine: E,
    pub(crate) lifecycle: ClientLifecycle,
    pub(crate) registry: ChainRegistry,
    pub(crate) logger: Logger,
}

impl<E> Shared<E> {
    /// Converts an engine failure into the error callers see. A crash or an engine that shuts
    /// down on its own destroys the client.
    pub(crate) fn engine_error(&self, err: EngineError) -> ClientError {
        match err {
            EngineError::Rejected(message) => ClientError::add_chain(message),
            EngineError::QueueFull => ClientError::QueueFull,
            EngineError::Malformed(reason) => ClientError::malformed(reason),
            EngineError::JsonRpcDisabled => ClientError::JsonRpcDisabled,
            EngineError::ChainNotFound => ClientError::chain_removed(),
            EngineError::ShuttingDown => {
                let _ = self.lifecycle.mark_destroyed(ClientError::client_destroyed());
                self.lifecycle.check_live().err().unwrap_or_else(ClientError::client_destroyed)
            }
            EngineError::Crashed(message) => {
                self.logger.error(LOG_TARGET, format_args!("engine crashed: {message}"));
                self.lifecycle.mark_crashed(message)
            }
        }
    }
}

/// Per-chain state. Fixed at creation except for the removed flag.
pub(crate) struct ChainState {
    pub(crate) token: ChainToken,
    pub(crate) id: ChainId,
    pub(crate) json_rpc_enabled: bool,
    pub(crate) lifecycle: ChainLifecycle,
}

/// Owner of the engine and factory of [`Chain`] handles.
pub struct Client<E: Engine> {
    shared: Arc<Shared<E>>,
}

impl<E: Engine> Client<E> {
    pub fn new(engine: E) -> Self {
        Self::with_logger(engine, Logger::default())
    }

    pub fn with_logger(engine: E, logger: Logger) -> Self {
        let nonce = NEXT_CLIENT_NONCE.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::new(Shared {
                engine,
                lifecycle: ClientLifecycle::default(),
                registry: ChainRegistry::new(nonce),
                logger,
            }),
        }
    }

    pub fn engine(&self) -> &E {
        &self.shared.engine
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.lifecycle.is_destroyed()
    }

    /// Asks the engine for a new chain.
    ///
    /// Relay chain candidates that were removed in the meantime are skipped silently. Whether
    /// one of the remaining candidates is the right relay chain is decided by the engine.
    pub async fn add_chain(&self, options: AddChainOptions) -> Result<Chain<E>, ClientError> {
        self.shared.lifecycle.check_live()?;

        let candidates = options.potential_relay_chains.len();
        let relay_chains = resolve_relay_chains(&self.shared.registry, &options.potential_relay_chains);
        if relay_chains.len() < candidates {
            self.shared.logger.debug(
                LOG_TARGET,
                format_args!(
                    "{} of {candidates} potential relay chain(s) no longer exist",
                    candidates - relay_chains.len()
                ),
            );
        }
        let json_rpc_enabled = !options.disable_json_rpc;
        let request = CreateChainRequest {
            chain_spec: options.chain_spec,
            database_content: options.database_content.unwrap_or_default(),
            relay_chains,
            disable_json_rpc: options.disable_json_rpc,
        };

        let id = match self.shared.engine.create_chain(request).await {
            Ok(id) => id,
            Err(err) => {
                let err = self.shared.engine_error(err);
                self.shared.logger.warn(
                    LOG_TARGET,
                    format_args!("{} failed: {err}", Operation::AddChain.as_str()),
                );
                return Err(err);
            }
        };

        // The client may have been terminated while the engine was busy.
        if let Err(err) = self.shared.lifecycle.check_live() {
            self.shared.engine.destroy_chain(id);
            return Err(err);
        }

        let token = self.shared.registry.mint();
        if let Err(err) = self.shared.registry.register(token, id) {
            self.shared.engine.destroy_chain(id);
            return Err(err);
        }
        self.shared.logger.debug(LOG_TARGET, format_args!("chain {id} registered as {token}"));

        Ok(Chain {
            shared: Arc::clone(&self.shared),
            state: ChainState { token, id, json_rpc_enabled, lifecycle: ChainLifecycle::default() },
        })
    }

    /// Like [`Client::add_chain`], with options given as an untyped JSON object.
    ///
    /// A destroyed client fails before the options are looked at; malformed options fail
    /// without contacting the engine.
    pub async fn add_chain_from_json(&self, options: &JsonValue) -> Result<Chain<E>, ClientError> {
        self.shared.lifecycle.check_live()?;
        let options = AddChainOptions::from_json(options)?;
        self.add_chain(options).await
    }

    /// Destroys the client. Every later call on it or on its chains fails, including a second
    /// `terminate`. The engine tears the chains down on its own.
    pub async fn terminate(&self) -> Result<(), ClientError> {
        self.shared.lifecycle.mark_destroyed(ClientError::client_destroyed())?;
        let dropped = self.shared.registry.clear();
        self.shared
            .logger
            .info(LOG_TARGET, format_args!("terminating with {dropped} chain(s) still active"));
        self.shared.engine.begin_shutdown();
        Ok(())
    }
}

impl<E: Engine> fmt::Debug for Client<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("terminated", &self.shared.lifecycle.is_destroyed())
            .field("chains", &self.shared.registry.len())
            .finish_non_exhaustive()
    }
}

/// Handle to one chain of a [`Client`].
pub struct Chain<E: Engine> {
    shared: Arc<Shared<E>>,
    state: ChainState,
}

impl<E: Engine> Chain<E> {
    /// Token to pass in [`AddChainOptions::potential_relay_chains`].
    pub fn token(&self) -> ChainToken {
        self.state.token
    }

    pub fn id(&self) -> ChainId {
        self.state.id
    }

    pub fn is_json_rpc_enabled(&self) -> bool {
        self.state.json_rpc_enabled
    }

    pub fn is_removed(&self) -> bool {
        self.state.lifecycle.is_removed()
    }

    /// Queues a JSON-RPC request. The response, if any, is obtained with
    /// [`Chain::next_json_rpc_response`].
    ///
    /// Requests of [`crate::MAX_JSON_RPC_REQUEST_LEN`] bytes or more fail with
    /// [`ClientError::MalformedJsonRpc`]. A full response queue fails with
    /// [`ClientError::QueueFull`]: read responses before sending more.
    pub fn send_json_rpc(&self, request: impl Into<String>) -> Result<(), ClientError> {
        router::send(&self.shared, &self.state, request.into()).map_err(|err| {
            self.shared.logger.debug(
                LOG_TARGET,
                format_args!(
                    "{} on chain {} failed: {err}",
                    Operation::SendJsonRpc.as_str(),
                    self.state.id
                ),
            );
            err
        })
    }

    /// Waits for the next JSON-RPC response or notification of this chain.
    ///
    /// The client, chain and JSON-RPC checks run when this method is called: if one fails, the
    /// returned future is already resolved with the error. Concurrent calls each receive a
    /// distinct item, in no particular order.
    pub fn next_json_rpc_response(
        &self,
    ) -> impl Future<Output = Result<String, ClientError>> + Send + '_ {
        let ready = router::check_json_rpc_usable(&self.shared, &self.state);
        async move {
            ready?;
            responses::next_response(&self.shared, &self.state).await
        }
    }

    /// Removes the chain. The handle is unusable afterwards.
    pub fn remove(&self) -> Result<(), ClientError> {
        self.shared.lifecycle.check_live()?;
        self.shared
            .registry
            .unregister_with(self.state.token, || self.state.lifecycle.mark_removed())?;
        self.shared.engine.destroy_chain(self.state.id);
        self.shared.logger.debug(
            LOG_TARGET,
            format_args!("{} {}", Operation::RemoveChain.as_str(), self.state.id),
        );
        Ok(())
    }
}

impl<E: Engine> fmt::Debug for Chain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("token", &self.state.token)
            .field("id", &self.state.id)
            .field("json_rpc_enabled", &self.state.json_rpc_enabled)
            .field("removed", &self.state.lifecycle.is_removed())
            .finish()
    }
}
