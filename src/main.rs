mod config;
mod error;
mod locator;
mod poller;
mod rpc;
mod sender;
mod snapshot;
mod stats;
#[cfg(test)]
mod test_support;

use dotenvy::dotenv;
use env_logger::Env;

use config::Config;
use error::AgentError;
use locator::Locator;
use poller::Poller;
use rpc::{HttpNodeRpc, NodeRpc};
use sender::HttpSender;

fn main() -> Result<(), AgentError> {
    let _ = dotenv();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    println!("📡 Starting node telemetry agent for {}", config.rpc_url);

    let rpc = HttpNodeRpc::connect(
        config.rpc_url.as_str(),
        config.rpc_timeout,
        config.connect_retry,
        config.connect_max_attempts,
    )?;
    rpc.start_mining(config.miner_threads)?;

    let sender = HttpSender::new(Locator::from_config(&config), config.send_timeout)?;

    Poller::new(rpc, sender, config.send_period).run()
}
