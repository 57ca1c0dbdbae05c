use std::io;
use std::net::IpAddr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracerouteError {
    #[error("Raw socket access denied, run as root or grant CAP_NET_RAW: {0}")]
    InsufficientPrivileges(#[source] io::Error),

    #[error("Failed to create socket: {0}")]
    SocketCreation(#[source] io::Error),

    #[error("Failed to configure socket: {0}")]
    SocketOption(#[source] io::Error),

    #[error("Failed to bind to local port {port}: {source}")]
    SocketBind {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Failed to send probe with ttl {ttl}: {source}")]
    Send {
        ttl: u8,
        #[source]
        source: io::Error,
    },

    #[error("Failed to receive reply: {0}")]
    Receive(#[source] io::Error),

    #[error("Failed to write trace output: {0}")]
    Output(#[source] io::Error),

    #[error("{0}: Hostname not resolvable.")]
    HostnameNotResolved(String),

    #[error("{0}: IPv6 destinations are not supported")]
    Ipv6NotSupported(IpAddr),

    #[error("Target ip address required!")]
    MissingDestination,
}

impl TracerouteError {
    /// Maps a socket creation failure, singling out the missing raw socket privilege.
    pub fn from_socket_creation(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => TracerouteError::InsufficientPrivileges(error),
            _ => TracerouteError::SocketCreation(error),
        }
    }
}
