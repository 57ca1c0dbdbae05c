use std::io;
use std::io::Read;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

pub struct AsyncSocket {
    socket_async_fd: AsyncFd<SocketWrapper>,
}

impl AsyncSocket {
    pub fn new(domain: Domain, ty: Type, protocol: Option<Protocol>) -> io::Result<Self> {
        let socket = SocketWrapper::new(domain, ty, protocol)?;

        let socket_async_fd = AsyncFd::new(socket)?;

        Ok(Self { socket_async_fd })
    }

    pub fn bind(&self, socket_addr: SocketAddr) -> io::Result<()> {
        self.socket_async_fd.get_ref().bind(socket_addr)
    }

    pub async fn send_to(&self, buf: &[u8], socket_addr: SocketAddr) -> io::Result<usize> {
        self.socket_async_fd
            .async_io(Interest::WRITABLE, |socket| socket.send_to(buf, socket_addr))
            .await
    }

    pub async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket_async_fd
            .async_io(Interest::READABLE, |socket| socket.recv(buf))
            .await
    }

    /// Waits at most `timeout` for one datagram; `None` when nothing became readable.
    pub async fn recv_within(&self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        match tokio::time::timeout(timeout, self.recv(buf)).await {
            Ok(received) => received.map(Some),
            Err(_elapsed) => Ok(None),
        }
    }

    pub fn set_ttl(&self, ttl: u32) -> io::Result<()> {
        self.socket_async_fd.get_ref().set_ttl(ttl)
    }
}

struct SocketWrapper {
    socket: Socket,
}

impl SocketWrapper {
    fn new(domain: Domain, ty: Type, protocol: Option<Protocol>) -> io::Result<Self> {
        let socket = Socket::new(domain, ty, protocol)?;

        socket.set_nonblocking(true)?;

        Ok(Self { socket })
    }

    fn bind(&self, socket_addr: SocketAddr) -> io::Result<()> {
        self.socket.bind(&socket_addr.into())
    }

    fn send_to(&self, buf: &[u8], socket_addr: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, &socket_addr.into())
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.socket).read(buf)
    }

    fn set_ttl(&self, ttl: u32) -> io::Result<()> {
        self.socket.set_ttl(ttl)
    }
}

impl AsRawFd for SocketWrapper {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}
