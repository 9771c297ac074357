//! The subset of a chain specification the loopback engine understands.
//!
//! Only identity fields and the parachain declaration are decoded. `genesis` must be present
//! but is kept opaque, and unknown top-level fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ChainType {
    Development,
    Local,
    #[default]
    Live,
    Custom(String),
}

impl ChainType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "Development",
            Self::Local => "Local",
            Self::Live => "Live",
            Self::Custom(name) => name.as_str(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParachainSpec {
    #[serde(alias = "relayChain")]
    pub relay_chain: String,
    #[serde(alias = "paraId")]
    pub para_id: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChainSpec {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub chain_type: ChainType,
    #[serde(default)]
    pub boot_nodes: Vec<String>,
    #[serde(default)]
    pub protocol_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_id: Option<String>,
    #[serde(default)]
    pub properties: Option<JsonValue>,
    pub genesis: JsonValue,
    #[serde(flatten)]
    pub parachain: Option<ParachainSpec>,
}

impl ChainSpec {
    pub fn from_json(input: &str) -> Result<Self, String> {
        let spec: Self = serde_json::from_str(input)
            .map_err(|err| format!("failed to decode chain specification: {err}"))?;
        if spec.id.trim().is_empty() {
            return Err("chain specification has an empty id".to_owned());
        }
        if !spec.genesis.is_object() {
            return Err("chain specification genesis must be an object".to_owned());
        }
        Ok(spec)
    }

    pub fn relay_chain(&self) -> Option<&str> {
        self.parachain.as_ref().map(|parachain| parachain.relay_chain.as_str())
    }

    pub fn para_id(&self) -> Option<u32> {
        self.parachain.as_ref().map(|parachain| parachain.para_id)
    }

    pub fn properties(&self) -> JsonValue {
        self.properties.clone().unwrap_or_else(|| JsonValue::Object(Default::default()))
    }
}
