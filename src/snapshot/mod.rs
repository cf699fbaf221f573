use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::rpc::{Block, NodeRpc};
use crate::stats::{avg_block_difficulty, avg_block_time};

/// One telemetry payload, posted to the collector as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub host_id: String,
    pub hashrate: u64,
    pub gas_price: u64,
    pub avg_block_difficulty: f64,
    pub avg_block_time: f64,
    pub is_mining: u8, // 0 or 1
}

impl Snapshot {
    /// Aggregate the new blocks and read the live node stats.
    pub fn gather<R: NodeRpc + ?Sized>(
        rpc: &R,
        new_blocks: &[Block],
        boundary: Option<&Block>,
    ) -> Result<Self> {
        Ok(Self {
            avg_block_difficulty: avg_block_difficulty(new_blocks),
            avg_block_time: avg_block_time(new_blocks, boundary),
            host_id: rpc.node_id()?,
            hashrate: rpc.hashrate()?,
            gas_price: rpc.gas_price()?,
            is_mining: u8::from(rpc.is_mining()?),
        })
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={} hashrate={} gas_price={} avg_difficulty={} avg_block_time={} mining={}",
            self.host_id,
            self.hashrate,
            self.gas_price,
            self.avg_block_difficulty,
            self.avg_block_time,
            self.is_mining
        )
    }
}
