use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::error::{AgentError, Result};
use crate::rpc::{Block, NodeRpc};
use crate::sender::{Deliver, SendOutcome};
use crate::snapshot::Snapshot;

/// Blocks mined since the previous cycle.
#[derive(Debug, Default)]
pub struct NewBlocks {
    /// Chain head after this fetch; becomes the next cursor.
    pub latest: u64,
    pub blocks: Vec<Block>,
}

/// Fetch every block in `(cursor, latest]`.
///
/// When the head has not moved past `cursor` the batch is empty and
/// `latest` stays at `cursor`, so the cursor never goes backwards.
pub fn fetch_new_blocks<R: NodeRpc + ?Sized>(rpc: &R, cursor: u64) -> Result<NewBlocks> {
    let head = rpc.latest_block_number()?;
    if head <= cursor {
        return Ok(NewBlocks {
            latest: cursor,
            blocks: Vec::new(),
        });
    }

    let mut blocks = Vec::with_capacity((head - cursor) as usize);
    for number in (cursor + 1)..=head {
        let block = rpc
            .block_by_number(number)?
            .ok_or(AgentError::MissingBlock(number))?;
        debug!(
            "block #{} {} ts={} difficulty={}",
            block.number,
            block.hash.as_deref().unwrap_or("-"),
            block.timestamp,
            block.difficulty
        );
        blocks.push(block);
    }
    Ok(NewBlocks {
        latest: head,
        blocks,
    })
}

/// Drives the sleep / fetch / aggregate / send cycle.
pub struct Poller<R, S> {
    rpc: R,
    sender: S,
    interval: Duration,
    /// Last block number already reported; 0 before the first report.
    cursor: u64,
}

impl<R: NodeRpc, S: Deliver> Poller<R, S> {
    pub fn new(rpc: R, sender: S, interval: Duration) -> Self {
        Self {
            rpc,
            sender,
            interval,
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Build the snapshot for the blocks mined since the last cycle and
    /// advance the cursor. Does not sleep or send.
    pub fn collect(&mut self) -> Result<Snapshot> {
        // genesis is never used as a boundary
        let boundary = if self.cursor > 0 {
            self.rpc.block_by_number(self.cursor)?
        } else {
            None
        };
        let fresh = fetch_new_blocks(&self.rpc, self.cursor)?;
        self.cursor = fresh.latest;
        Snapshot::gather(&self.rpc, &fresh.blocks, boundary.as_ref())
    }

    /// One full cycle: sleep, collect, send.
    pub fn tick(&mut self) -> Result<SendOutcome> {
        thread::sleep(self.interval);
        let snapshot = self.collect()?;
        info!("block #{}: {}", self.cursor(), snapshot);
        Ok(self.sender.deliver(&snapshot))
    }

    /// Cycle until an RPC call fails.
    pub fn run(&mut self) -> Result<()> {
        info!("reporting every {:?}", self.interval);
        loop {
            self.tick()?;
        }
    }
}
