use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

use log::debug;

use crate::config::Config;
use crate::error::{AgentError, Result};

/// Environment lookups the locator depends on.
pub trait HostProbe {
    /// Whether `host` resolves via DNS.
    fn resolves(&self, host: &str) -> bool;
    /// First IPv4 address bound to the interface called `name`.
    fn interface_ipv4(&self, name: &str) -> Option<Ipv4Addr>;
}

/// Probes the real system resolver and network interfaces.
pub struct SystemProbe;

impl HostProbe for SystemProbe {
    fn resolves(&self, host: &str) -> bool {
        // port is irrelevant for the lookup
        (host, 0)
            .to_socket_addrs()
            .map(|mut addrs| addrs.next().is_some())
            .unwrap_or(false)
    }

    fn interface_ipv4(&self, name: &str) -> Option<Ipv4Addr> {
        let ifaces = if_addrs::get_if_addrs().ok()?;
        ifaces
            .into_iter()
            .filter(|iface| iface.name == name)
            .find_map(|iface| match iface.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
    }
}

/// Works out where the collector is reachable from inside the container.
pub struct Locator<P: HostProbe = SystemProbe> {
    probe: P,
    explicit_url: Option<String>,
    host_alias: String,
    interface: String,
    port: u16,
}

impl Locator<SystemProbe> {
    pub fn from_config(config: &Config) -> Self {
        Self::with_probe(SystemProbe, config)
    }
}

impl<P: HostProbe> Locator<P> {
    pub fn with_probe(probe: P, config: &Config) -> Self {
        Self {
            probe,
            explicit_url: config.collector_url.clone(),
            host_alias: config.host_alias.clone(),
            interface: config.bridge_interface.clone(),
            port: config.collector_port,
        }
    }

    /// Collector base URL. Re-evaluated on every call.
    ///
    /// An explicit URL wins. Otherwise, if the platform host alias resolves
    /// (Docker for Mac) it is used directly; if not, the collector is assumed
    /// to sit on the bridge gateway (`x.y.z.1`) of the configured interface.
    pub fn collector_url(&self) -> Result<String> {
        if let Some(url) = &self.explicit_url {
            return Ok(url.clone());
        }
        if self.probe.resolves(&self.host_alias) {
            debug!("{} resolves, using host alias", self.host_alias);
            return Ok(format!("http://{}:{}", self.host_alias, self.port));
        }
        let ip = self
            .probe
            .interface_ipv4(&self.interface)
            .ok_or_else(|| AgentError::InterfaceNotFound(self.interface.clone()))?;
        let gateway = bridge_gateway(ip);
        debug!("{} has {}, using bridge gateway {}", self.interface, ip, gateway);
        Ok(format!("http://{}:{}", gateway, self.port))
    }
}

/// `a.b.c.d` -> `a.b.c.1`
pub fn bridge_gateway(ip: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = ip.octets();
    Ipv4Addr::new(a, b, c, 1)
}
