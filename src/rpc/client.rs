use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use serde_json::{Value, json};

use super::models::{Block, NodeInfo, RpcRequest, RpcResponse, quantity_u64};
use crate::error::{AgentError, Result};

/// Read access to the node plus the one write the agent issues (start mining).
pub trait NodeRpc {
    fn block_by_number(&self, number: u64) -> Result<Option<Block>>;
    fn latest_block_number(&self) -> Result<u64>;
    fn hashrate(&self) -> Result<u64>;
    fn gas_price(&self) -> Result<u64>;
    fn is_mining(&self) -> Result<bool>;
    fn node_id(&self) -> Result<String>;
    fn start_mining(&self, threads: u32) -> Result<()>;
}

impl<T: NodeRpc + ?Sized> NodeRpc for &T {
    fn block_by_number(&self, number: u64) -> Result<Option<Block>> {
        (**self).block_by_number(number)
    }
    fn latest_block_number(&self) -> Result<u64> {
        (**self).latest_block_number()
    }
    fn hashrate(&self) -> Result<u64> {
        (**self).hashrate()
    }
    fn gas_price(&self) -> Result<u64> {
        (**self).gas_price()
    }
    fn is_mining(&self) -> Result<bool> {
        (**self).is_mining()
    }
    fn node_id(&self) -> Result<String> {
        (**self).node_id()
    }
    fn start_mining(&self, threads: u32) -> Result<()> {
        (**self).start_mining(threads)
    }
}

/// JSON-RPC over HTTP, blocking.
pub struct HttpNodeRpc {
    url: String,
    client: Client,
    next_id: AtomicU64,
}

impl HttpNodeRpc {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Build a client and block until the node answers. Retries every
    /// `retry` forever, or at most `max_attempts` times when given.
    pub fn connect(
        url: impl Into<String>,
        timeout: Duration,
        retry: Duration,
        max_attempts: Option<u32>,
    ) -> Result<Self> {
        let rpc = Self::new(url, timeout)?;
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            match rpc.client_version() {
                Ok(version) => {
                    info!("connected to node at {} ({})", rpc.url, version);
                    return Ok(rpc);
                }
                Err(e) => {
                    debug!("node at {} not reachable yet (attempt {}): {}", rpc.url, attempts, e);
                    if max_attempts.is_some_and(|max| attempts >= max) {
                        return Err(AgentError::ConnectExhausted {
                            url: rpc.url.clone(),
                            attempts,
                        });
                    }
                    thread::sleep(retry);
                }
            }
        }
    }

    /// Connectivity probe.
    pub fn client_version(&self) -> Result<String> {
        let value = self.call("web3_clientVersion", json!([]))?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;
        response.into_result()
    }

    fn call_non_null(&self, method: &str, params: Value) -> Result<Value> {
        let value = self.call(method, params)?;
        if value.is_null() {
            return Err(AgentError::EmptyResult(method.to_string()));
        }
        Ok(value)
    }
}

impl NodeRpc for HttpNodeRpc {
    fn block_by_number(&self, number: u64) -> Result<Option<Block>> {
        let value = self.call("eth_getBlockByNumber", json!([format!("0x{number:x}"), false]))?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    fn latest_block_number(&self) -> Result<u64> {
        quantity_u64(&self.call_non_null("eth_blockNumber", json!([]))?)
    }

    fn hashrate(&self) -> Result<u64> {
        quantity_u64(&self.call_non_null("eth_hashrate", json!([]))?)
    }

    fn gas_price(&self) -> Result<u64> {
        quantity_u64(&self.call_non_null("eth_gasPrice", json!([]))?)
    }

    fn is_mining(&self) -> Result<bool> {
        Ok(serde_json::from_value(self.call_non_null("eth_mining", json!([]))?)?)
    }

    fn node_id(&self) -> Result<String> {
        let info: NodeInfo = serde_json::from_value(self.call_non_null("admin_nodeInfo", json!([]))?)?;
        Ok(info.id)
    }

    fn start_mining(&self, threads: u32) -> Result<()> {
        // geth answers with `null`
        self.call("miner_start", json!([threads]))?;
        info!("mining started with {} thread(s)", threads);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_url, spawn_server};
    use actix_web::{HttpResponse, web};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<(String, Value)>>>;

    /// A tiny geth stand-in with fixed stats; only blocks 1 and 2 are served.
    async fn fake_geth(calls: web::Data<Calls>, body: web::Json<Value>) -> HttpResponse {
        let method = body["method"].as_str().unwrap_or_default().to_string();
        let params = body["params"].clone();
        calls.lock().unwrap().push((method.clone(), params.clone()));

        let result = match method.as_str() {
            "web3_clientVersion" => json!("Geth/v1.8.0"),
            "eth_blockNumber" => json!("0x3"),
            "eth_hashrate" => json!("0x1f4"),
            "eth_gasPrice" => json!("0x3b9aca00"),
            "eth_mining" => json!(true),
            "admin_nodeInfo" => json!({ "id": "enode-abc", "name": "Geth" }),
            "miner_start" => Value::Null,
            "eth_getBlockByNumber" => match params[0].as_str() {
                Some("0x1") => json!({ "number": "0x1", "timestamp": "0x64", "difficulty": "0x20000" }),
                Some("0x2") => json!({ "number": "0x2", "timestamp": "0x6e", "difficulty": "0x20040" }),
                _ => Value::Null,
            },
            _ => {
                return HttpResponse::Ok().json(json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "error": { "code": -32601, "message": "the method does not exist" }
                }));
            }
        };
        HttpResponse::Ok().json(json!({ "jsonrpc": "2.0", "id": body["id"], "result": result }))
    }

    fn node() -> (HttpNodeRpc, Calls, String) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let data = web::Data::new(calls.clone());
        let url = spawn_server(move |cfg| {
            cfg.app_data(data.clone())
                .route("/", web::post().to(fake_geth));
        });
        let rpc = HttpNodeRpc::new(url.as_str(), Duration::from_secs(5)).unwrap();
        (rpc, calls, url)
    }

    #[test]
    fn reads_node_statistics() {
        let (rpc, _, _) = node();
        assert_eq!(rpc.latest_block_number().unwrap(), 3);
        assert_eq!(rpc.hashrate().unwrap(), 500);
        assert_eq!(rpc.gas_price().unwrap(), 1_000_000_000);
        assert!(rpc.is_mining().unwrap());
        assert_eq!(rpc.node_id().unwrap(), "enode-abc");
    }

    #[test]
    fn fetches_blocks_and_maps_null_to_none() {
        let (rpc, calls, _) = node();
        let block = rpc.block_by_number(2).unwrap().unwrap();
        assert_eq!(block.number, 2);
        assert_eq!(block.timestamp, 110);
        assert_eq!(block.difficulty, 0x20040);
        assert_eq!(rpc.block_by_number(9).unwrap(), None);

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].0, "eth_getBlockByNumber");
        assert_eq!(calls[0].1, json!(["0x2", false]));
    }

    #[test]
    fn start_mining_sends_thread_count() {
        let (rpc, calls, _) = node();
        rpc.start_mining(2).unwrap();
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].0, "miner_start");
        assert_eq!(calls[0].1, json!([2]));
    }

    #[test]
    fn connect_returns_once_node_answers() {
        let (_, _, url) = node();
        let connected =
            HttpNodeRpc::connect(url, Duration::from_secs(5), Duration::from_millis(10), Some(3))
                .unwrap();
        assert_eq!(connected.client_version().unwrap(), "Geth/v1.8.0");
    }

    #[test]
    fn connect_gives_up_after_max_attempts() {
        let url = closed_port_url();
        let err = HttpNodeRpc::connect(
            url,
            Duration::from_millis(200),
            Duration::from_millis(1),
            Some(3),
        )
        .err()
        .unwrap();
        match err {
            AgentError::ConnectExhausted { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rpc_error_object_surfaces_as_error() {
        let (rpc, _, _) = node();
        let err = rpc.call("eth_unknown", json!([])).unwrap_err();
        assert!(matches!(err, AgentError::Rpc { code: -32601, .. }));
    }
}
