use thiserror::Error;

/// Everything that can go wrong while talking to the node or the collector.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode json: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("rpc call `{0}` returned no result")]
    EmptyResult(String),

    #[error("invalid hex quantity: {0:?}")]
    InvalidQuantity(String),

    #[error("block #{0} is not available on the node")]
    MissingBlock(u64),

    #[error("could not reach node at {url} after {attempts} attempts")]
    ConnectExhausted { url: String, attempts: u32 },

    #[error("network interface `{0}` has no IPv4 address")]
    InterfaceNotFound(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
