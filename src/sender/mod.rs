use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::Result;
use crate::locator::{HostProbe, Locator, SystemProbe};
use crate::snapshot::Snapshot;

/// What became of a snapshot. Nothing is retried either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The POST timed out; the collector has most likely received it anyway.
    TimedOut,
    Dropped,
}

/// Where snapshots go.
pub trait Deliver {
    fn deliver(&self, snapshot: &Snapshot) -> SendOutcome;
}

impl<T: Deliver + ?Sized> Deliver for &T {
    fn deliver(&self, snapshot: &Snapshot) -> SendOutcome {
        (**self).deliver(snapshot)
    }
}

/// Fire-and-forget HTTP POST to the collector.
pub struct HttpSender<P: HostProbe = SystemProbe> {
    client: Client,
    locator: Locator<P>,
}

impl<P: HostProbe> HttpSender<P> {
    pub fn new(locator: Locator<P>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, locator })
    }
}

impl<P: HostProbe> Deliver for HttpSender<P> {
    fn deliver(&self, snapshot: &Snapshot) -> SendOutcome {
        let url = match self.locator.collector_url() {
            Ok(url) => url,
            Err(e) => {
                warn!("could not locate collector, snapshot dropped: {}", e);
                return SendOutcome::Dropped;
            }
        };
        debug!("posting snapshot to {}", url);

        let sent = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(snapshot)
            .send();

        match sent {
            Ok(resp) if resp.status().is_success() => SendOutcome::Delivered,
            Ok(resp) => {
                warn!("collector at {} answered {}", url, resp.status());
                SendOutcome::Delivered
            }
            Err(e) if e.is_timeout() => {
                info!("post to {} timed out, request was probably delivered", url);
                SendOutcome::TimedOut
            }
            Err(e) => {
                warn!("could not reach collector at {}, snapshot dropped: {}", url, e);
                SendOutcome::Dropped
            }
        }
    }
}
