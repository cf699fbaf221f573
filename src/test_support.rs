//! Shared fixtures: an in-memory node and throwaway actix-web servers.

use std::cell::{Cell, RefCell};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use actix_web::web::ServiceConfig;
use actix_web::{App, HttpServer};

use crate::error::Result;
use crate::rpc::{Block, NodeRpc};

/// Chain kept in memory. Block 0 is genesis (timestamp 0); the others are
/// numbered from 1 in insertion order.
pub struct FakeNode {
    chain: RefCell<Vec<Block>>,
    mining: Cell<bool>,
    pub block_reads: RefCell<Vec<u64>>,
}

impl FakeNode {
    pub fn with_timestamps(stamps: &[u64]) -> Self {
        let node = Self {
            chain: RefCell::new(vec![Block::at(0, 0)]),
            mining: Cell::new(true),
            block_reads: RefCell::new(Vec::new()),
        };
        for &ts in stamps {
            node.mine(ts);
        }
        node
    }

    pub fn mine(&self, timestamp: u64) {
        let mut chain = self.chain.borrow_mut();
        let number = chain.len() as u64;
        chain.push(Block::at(number, timestamp));
    }

    /// Drop blocks above `number`, as after a reorg to a shorter chain.
    pub fn truncate(&self, number: u64) {
        self.chain.borrow_mut().truncate(number as usize + 1);
    }

    pub fn set_mining(&self, on: bool) {
        self.mining.set(on);
    }
}

impl NodeRpc for FakeNode {
    fn block_by_number(&self, number: u64) -> Result<Option<Block>> {
        self.block_reads.borrow_mut().push(number);
        Ok(self.chain.borrow().get(number as usize).cloned())
    }

    fn latest_block_number(&self) -> Result<u64> {
        Ok(self.chain.borrow().len() as u64 - 1)
    }

    fn hashrate(&self) -> Result<u64> {
        Ok(if self.mining.get() { 500 } else { 0 })
    }

    fn gas_price(&self) -> Result<u64> {
        Ok(18_000_000_000)
    }

    fn is_mining(&self) -> Result<bool> {
        Ok(self.mining.get())
    }

    fn node_id(&self) -> Result<String> {
        Ok("fake-node".to_string())
    }

    fn start_mining(&self, _threads: u32) -> Result<()> {
        self.mining.set(true);
        Ok(())
    }
}

/// Run an actix-web app on an ephemeral local port in a background thread
/// and return its base URL. The server lives until the test process exits.
pub fn spawn_server<F>(configure: F) -> String
where
    F: Fn(&mut ServiceConfig) + Send + Clone + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let sys = actix_web::rt::System::new();
        sys.block_on(async move {
            let server = HttpServer::new(move || App::new().configure(configure.clone()))
                .workers(1)
                .bind(("127.0.0.1", 0))
                .expect("bind test server");
            let addr = server.addrs()[0];
            let running = server.run();
            tx.send(addr).expect("report test server address");
            running.await
        })
    });
    let addr = rx.recv().expect("test server did not start");
    format!("http://{addr}")
}

/// URL of a local port nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe port");
    let addr = listener.local_addr().expect("probe port address");
    drop(listener);
    format!("http://{addr}")
}
