use crate::rpc::Block;

/// Mean of the "difficulty" value over the new blocks, 0 for an empty batch.
///
/// NOTE: this averages `timestamp`, not `difficulty`. Collectors consume
/// the value under this name as-is.
pub fn avg_block_difficulty(new_blocks: &[Block]) -> f64 {
    if new_blocks.is_empty() {
        return 0.0;
    }
    let total: f64 = new_blocks.iter().map(|b| b.timestamp as f64).sum();
    total / new_blocks.len() as f64
}

/// Mean gap between consecutive timestamps of `[boundary, new_blocks...]`.
///
/// `boundary` is the last block of the previous cycle; it is `None` on the
/// first cycle (the genesis block is never used as a boundary). Returns 0
/// when fewer than two timestamps are available.
pub fn avg_block_time(new_blocks: &[Block], boundary: Option<&Block>) -> f64 {
    let timestamps: Vec<f64> = boundary
        .into_iter()
        .chain(new_blocks)
        .map(|b| b.timestamp as f64)
        .collect();
    if timestamps.len() < 2 {
        return 0.0;
    }
    let deltas: f64 = timestamps.windows(2).map(|w| w[1] - w[0]).sum();
    deltas / (timestamps.len() - 1) as f64
}
