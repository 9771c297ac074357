use crate::error::ClientError;
use crate::types::ChainToken;
use serde_json::Value as JsonValue;

/// Parameters of [`crate::Client::add_chain`].
///
/// Do not try to deduplicate chains yourself by comparing specifications: the engine already
/// shares resources between identical chains and is the only component able to decide safely
/// whether two specifications are equivalent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddChainOptions {
    /// JSON chain specification, passed to the engine untouched.
    pub chain_spec: String,
    /// Database content saved from a previous run of the same chain.
    pub database_content: Option<String>,
    /// Chains that might be the relay chain of this one. Removed chains are ignored.
    pub potential_relay_chains: Vec<ChainToken>,
    /// When set, the chain never accepts JSON-RPC requests.
    pub disable_json_rpc: bool,
}

impl AddChainOptions {
    pub fn new(chain_spec: impl Into<String>) -> Self {
        Self { chain_spec: chain_spec.into(), ..Default::default() }
    }

    pub fn with_database_content(mut self, database_content: impl Into<String>) -> Self {
        self.database_content = Some(database_content.into());
        self
    }

    pub fn with_potential_relay_chains(
        mut self,
        relay_chains: impl IntoIterator<Item = ChainToken>,
    ) -> Self {
        self.potential_relay_chains.extend(relay_chains);
        self
    }

    pub fn with_json_rpc_disabled(mut self, disabled: bool) -> Self {
        self.disable_json_rpc = disabled;
        self
    }

    /// Builds options from an untyped object
    /// `{chainSpec, databaseContent?, potentialRelayChains?, disableJsonRpc?}`.
    ///
    /// Structurally wrong input fails with [`ClientError::AddChain`] describing the offending
    /// field. Unknown fields are ignored.
    pub fn from_json(options: &JsonValue) -> Result<Self, ClientError> {
        let object = options
            .as_object()
            .ok_or_else(|| ClientError::add_chain("options must be an object"))?;

        let chain_spec = match object.get("chainSpec") {
            Some(JsonValue::String(spec)) => spec.clone(),
            Some(other) => {
                return Err(ClientError::add_chain(format!(
                    "chainSpec must be a string, got {}",
                    json_kind(other)
                )))
            }
            None => return Err(ClientError::add_chain("chainSpec is required")),
        };

        let database_content = match object.get("databaseContent") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(content)) => Some(content.clone()),
            Some(other) => {
                return Err(ClientError::add_chain(format!(
                    "databaseContent must be a string, got {}",
                    json_kind(other)
                )))
            }
        };

        let potential_relay_chains = match object.get("potentialRelayChains") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(entries)) => entries
                .iter()
                .map(|entry| {
                    serde_json::from_value::<ChainToken>(entry.clone()).map_err(|err| {
                        ClientError::add_chain(format!(
                            "potentialRelayChains must only contain chain tokens: {err}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(ClientError::add_chain(format!(
                    "potentialRelayChains must be an array, got {}",
                    json_kind(other)
                )))
            }
        };

        let disable_json_rpc = match object.get("disableJsonRpc") {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::Bool(flag)) => *flag,
            Some(other) => {
                return Err(ClientError::add_chain(format!(
                    "disableJsonRpc must be a boolean, got {}",
                    json_kind(other)
                )))
            }
        };

        Ok(Self { chain_spec, database_content, potential_relay_chains, disable_json_rpc })
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
