use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AgentError, Result};

/// A block as reported by the node. Only the fields the agent reads are kept.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Block {
    #[serde(deserialize_with = "de_quantity")]
    pub number: u64,
    #[serde(deserialize_with = "de_quantity")]
    pub timestamp: u64, // Unix timestamp (seconds)
    #[serde(default, deserialize_with = "de_quantity_u128")]
    pub difficulty: u128, // absent on post-merge nodes
    #[serde(default)]
    pub hash: Option<String>,
}

#[cfg(test)]
impl Block {
    pub fn at(number: u64, timestamp: u64) -> Self {
        Self {
            number,
            timestamp,
            difficulty: 0,
            hash: None,
        }
    }
}

/// Outgoing JSON-RPC 2.0 request.
#[derive(Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Incoming JSON-RPC 2.0 response; `result` stays raw until the caller
/// knows what it expects.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(err) => Err(AgentError::Rpc {
                code: err.code,
                message: err.message,
            }),
            None => Ok(self.result),
        }
    }
}

/// `admin_nodeInfo` payload; only the identity is used.
#[derive(Debug, Deserialize)]
pub struct NodeInfo {
    pub id: String,
}

/// Parse an Ethereum hex quantity such as `"0x1b4"`.
pub fn parse_quantity(raw: &str) -> Result<u128> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| AgentError::InvalidQuantity(raw.to_string()))?;
    if digits.is_empty() {
        return Err(AgentError::InvalidQuantity(raw.to_string()));
    }
    u128::from_str_radix(digits, 16).map_err(|_| AgentError::InvalidQuantity(raw.to_string()))
}

/// Decode a JSON value holding a hex quantity into a `u64`.
pub fn quantity_u64(value: &Value) -> Result<u64> {
    let raw = value
        .as_str()
        .ok_or_else(|| AgentError::InvalidQuantity(value.to_string()))?;
    let n = parse_quantity(raw)?;
    u64::try_from(n).map_err(|_| AgentError::InvalidQuantity(raw.to_string()))
}

fn de_quantity<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let n = parse_quantity(&raw).map_err(serde::de::Error::custom)?;
    u64::try_from(n).map_err(serde::de::Error::custom)
}

fn de_quantity_u128<'de, D>(deserializer: D) -> std::result::Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_quantity(&raw).map_err(serde::de::Error::custom)
}
