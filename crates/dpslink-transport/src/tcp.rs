use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::Endpoint;

/// Non-blocking TCP listener for bridge clients.
pub struct BridgeListener {
    listener: TcpListener,
    addr: SocketAddr,
}

impl BridgeListener {
    /// Bind and listen on a TCP address.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr,
            source: e,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|e| TransportError::Bind { addr, source: e })?;
        let addr = listener.local_addr()?;
        info!(%addr, "listening for bridge clients");
        Ok(Self { listener, addr })
    }

    /// Accept one pending connection, if any.
    pub fn try_accept(&self) -> Result<Option<TcpEndpoint>> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                stream
                    .set_nonblocking(true)
                    .map_err(TransportError::Accept)?;
                debug!(%peer, "accepted client connection");
                Ok(Some(TcpEndpoint::new(stream)))
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

/// A connected TCP client endpoint.
///
/// Liveness is tracked from observed stream state: an orderly EOF or a
/// non-transient I/O error marks the endpoint dead so its slot can be
/// reclaimed.
pub struct TcpEndpoint {
    stream: TcpStream,
    live: bool,
}

impl TcpEndpoint {
    fn new(stream: TcpStream) -> Self {
        Self { stream, live: true }
    }

    /// Wrap an already-connected stream, switching it to non-blocking mode.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self::new(stream))
    }

    /// The remote address, when still known to the OS.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.peer_addr().ok()
    }
}

impl Endpoint for TcpEndpoint {
    fn is_live(&self) -> bool {
        self.live
    }

    fn peek(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.stream.peek(buf) {
            Ok(0) => {
                self.live = false;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(err) if is_transient(&err) => Ok(0),
            Err(err) => {
                self.live = false;
                Err(err)
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.stream.read(buf) {
            Ok(0) => {
                self.live = false;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(err) if is_transient(&err) => Ok(0),
            Err(err) => {
                self.live = false;
                Err(err)
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> std::io::Result<()> {
        let mut offset = 0usize;
        while offset < buf.len() {
            match self.stream.write(&buf[offset..]) {
                Ok(0) => {
                    self.live = false;
                    return Err(std::io::Error::from(ErrorKind::WriteZero));
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    // No capacity this cycle; the remainder is dropped.
                    trace!(dropped = buf.len() - offset, "write skipped, endpoint full");
                    return Ok(());
                }
                Err(err) => {
                    self.live = false;
                    return Err(err);
                }
            }
        }
        let _ = self.stream.flush();
        Ok(())
    }
}

fn is_transient(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted)
}
