use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

const DEFAULT_DNS_PORT: u16 = 53;

/// Transport a query arrived on. Recursion reuses it towards upstreams and
/// the response size ceiling depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportProtocol {
    Udp,
    Tcp,
}

impl TransportProtocol {
    pub fn protocol_name(&self) -> &'static str {
        match self {
            TransportProtocol::Udp => "UDP",
            TransportProtocol::Tcp => "TCP",
        }
    }

    pub fn is_udp(&self) -> bool {
        matches!(self, TransportProtocol::Udp)
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.protocol_name())
    }
}

impl FromStr for TransportProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "udp" => Ok(TransportProtocol::Udp),
            "tcp" => Ok(TransportProtocol::Tcp),
            other => Err(format!("Unknown transport protocol '{}'", other)),
        }
    }
}

/// Upstream nameserver used by recursion. Accepts `ip`, `ip:port` and
/// `[ipv6]:port`; a bare address gets port 53.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameServerAddr(SocketAddr);

impl NameServerAddr {
    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.0
    }

    pub fn is_loopback(&self) -> bool {
        self.0.ip().is_loopback()
    }
}

impl fmt::Display for NameServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NameServerAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Self(addr));
        }
        let host = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(s);
        host.parse::<IpAddr>()
            .map(|ip| Self(SocketAddr::new(ip, DEFAULT_DNS_PORT)))
            .map_err(|_| format!("Invalid nameserver address '{}'", s))
    }
}
