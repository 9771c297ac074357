use crate::client::{ChainState, Shared};
use crate::engine::Engine;
use crate::error::ClientError;

/// Requests of this many bytes or more are refused before reaching the engine, which could not
/// report an error for them through the regular per-request channel.
pub const MAX_JSON_RPC_REQUEST_LEN: usize = 64 * 1024 * 1024;

/// Checks shared by sending and receiving, in precedence order: destroyed client, removed
/// chain, disabled JSON-RPC.
pub(crate) fn check_json_rpc_usable<E>(
    shared: &Shared<E>,
    chain: &ChainState,
) -> Result<(), ClientError> {
    shared.lifecycle.check_live()?;
    chain.lifecycle.check_live()?;
    if !chain.json_rpc_enabled {
        return Err(ClientError::JsonRpcDisabled);
    }
    Ok(())
}

pub(crate) fn send<E: Engine>(
    shared: &Shared<E>,
    chain: &ChainState,
    request: String,
) -> Result<(), ClientError> {
    check_json_rpc_usable(shared, chain)?;
    if request.len() >= MAX_JSON_RPC_REQUEST_LEN {
        return Err(ClientError::malformed(format!(
            "request is {} bytes, the limit is {} bytes exclusive",
            request.len(),
            MAX_JSON_RPC_REQUEST_LEN
        )));
    }
    shared.engine.submit_request(chain.id, request).map_err(|err| shared.engine_error(err))
}
