use std::env;
use std::time::Duration;

/// Node JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Seconds between two telemetry cycles.
pub const DEFAULT_SEND_PERIOD_SECS: u64 = 10;

/// Delay between connection attempts at start-up.
pub const DEFAULT_CONNECT_RETRY_SECS: u64 = 1;

/// Threads passed to `miner_start`.
pub const DEFAULT_MINER_THREADS: u32 = 1;

/// Per-call timeout for node RPC requests.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Port the collector listens on.
pub const DEFAULT_COLLECTOR_PORT: u16 = 3030;

/// Resolves only on Docker for Mac, where it points to the host.
pub const DEFAULT_HOST_ALIAS: &str = "docker.for.mac.localhost";

/// Interface attached to the Docker bridge network on Linux.
pub const DEFAULT_BRIDGE_INTERFACE: &str = "eth0";

/// Timeout for the snapshot POST.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 1000;

/// Runtime settings. Every field has a compiled-in default that can be
/// overridden through the environment (or a `.env` file).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub rpc_url: String,
    pub send_period: Duration,
    pub connect_retry: Duration,
    pub connect_max_attempts: Option<u32>,
    pub miner_threads: u32,
    pub rpc_timeout: Duration,
    pub collector_url: Option<String>,
    pub collector_port: u16,
    pub host_alias: String,
    pub bridge_interface: String,
    pub send_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            send_period: Duration::from_secs(DEFAULT_SEND_PERIOD_SECS),
            connect_retry: Duration::from_secs(DEFAULT_CONNECT_RETRY_SECS),
            connect_max_attempts: None,
            miner_threads: DEFAULT_MINER_THREADS,
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            collector_url: None,
            collector_port: DEFAULT_COLLECTOR_PORT,
            host_alias: DEFAULT_HOST_ALIAS.to_string(),
            bridge_interface: DEFAULT_BRIDGE_INTERFACE.to_string(),
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
        }
    }
}

impl Config {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Missing or unparsable
    /// values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let number = |key: &str| text(key).and_then(|v| v.parse::<u64>().ok());

        let defaults = Self::default();
        Self {
            rpc_url: text("RPC_URL").unwrap_or(defaults.rpc_url),
            send_period: number("SEND_PERIOD_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.send_period),
            connect_retry: number("CONNECT_RETRY_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_retry),
            connect_max_attempts: text("CONNECT_MAX_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .filter(|n: &u32| *n > 0),
            miner_threads: text("MINER_THREADS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.miner_threads),
            rpc_timeout: number("RPC_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rpc_timeout),
            collector_url: text("COLLECTOR_URL"),
            collector_port: text("COLLECTOR_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.collector_port),
            host_alias: text("HOST_ALIAS").unwrap_or(defaults.host_alias),
            bridge_interface: text("BRIDGE_INTERFACE").unwrap_or(defaults.bridge_interface),
            send_timeout: number("SEND_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.send_timeout),
        }
    }
}
