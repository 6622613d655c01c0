pub mod client;

use std::fmt::Display;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Well-known Modbus TCP port.
pub const DEFAULT_PORT: u16 = 502;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.host, self.port))
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}:{}", self.host, self.port)
    }
}
