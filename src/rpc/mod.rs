pub mod client;
pub mod models;

pub use client::{HttpNodeRpc, NodeRpc};
pub use models::Block;
