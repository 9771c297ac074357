use crate::client::{ChainState, Shared};
use crate::engine::Engine;
use crate::error::ClientError;

/// Waits for the engine to hand over the next response of `chain`.
///
/// Preconditions are the caller's job: they must be evaluated when the public method is
/// invoked, not when this future is first polled. Each call consumes exactly one item from the
/// engine's queue. Responses already queued when the chain is removed may still be delivered;
/// afterwards the engine reports the chain as gone, surfaced as a removed chain.
pub(crate) async fn next_response<E: Engine>(
    shared: &Shared<E>,
    chain: &ChainState,
) -> Result<String, ClientError> {
    shared.engine.pull_response(chain.id).await.map_err(|err| shared.engine_error(err))
}
