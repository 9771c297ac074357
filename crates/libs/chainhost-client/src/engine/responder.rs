use super::chain_spec::ChainSpec;
use serde_json::{json, Value as JsonValue};

const METHOD_NOT_FOUND: i64 = -32601;

const METHODS: &[&str] = &[
    "chainHead_unstable_finalizedDatabase",
    "chainSpec_v1_chainName",
    "chainSpec_v1_properties",
    "rpc_methods",
    "system_chain",
    "system_chainType",
    "system_name",
    "system_properties",
    "system_version",
];

/// Static facts the responder answers from.
pub(crate) struct ResponderContext<'a> {
    pub node_name: &'a str,
    pub spec: &'a ChainSpec,
    pub database_content: &'a str,
}

/// Answers one JSON-RPC 2.0 request. Returns `Ok(None)` for notifications and `Err` when the
/// input is not a JSON-RPC request at all.
pub(crate) fn answer(ctx: &ResponderContext<'_>, request: &str) -> Result<Option<String>, String> {
    let parsed: JsonValue =
        serde_json::from_str(request).map_err(|err| format!("invalid JSON: {err}"))?;
    let object = parsed.as_object().ok_or_else(|| "request must be a JSON object".to_owned())?;
    if object.get("jsonrpc").and_then(JsonValue::as_str) != Some("2.0") {
        return Err("missing or unsupported \"jsonrpc\" version".to_owned());
    }
    let method = object
        .get("method")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| "missing \"method\"".to_owned())?;
    let Some(id) = object.get("id") else {
        return Ok(None);
    };
    if !(id.is_string() || id.is_number() || id.is_null()) {
        return Err("\"id\" must be a string, a number or null".to_owned());
    }

    let response = match result_for(ctx, method) {
        Some(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        None => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": METHOD_NOT_FOUND, "message": "Method not found" }
        }),
    };
    Ok(Some(response.to_string()))
}

fn result_for(ctx: &ResponderContext<'_>, method: &str) -> Option<JsonValue> {
    let result = match method {
        "system_name" => json!(ctx.node_name),
        "system_version" => json!(env!("CARGO_PKG_VERSION")),
        "system_chain" | "chainSpec_v1_chainName" => json!(ctx.spec.name),
        "system_chainType" => json!(ctx.spec.chain_type.as_str()),
        "system_properties" | "chainSpec_v1_properties" => ctx.spec.properties(),
        "chainHead_unstable_finalizedDatabase" => json!(ctx.database_content),
        "rpc_methods" => json!({ "methods": METHODS }),
        _ => return None,
    };
    Some(result)
}
