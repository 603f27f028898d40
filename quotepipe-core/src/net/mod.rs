//! Stream endpoints: connection-oriented byte transport with a typed error taxonomy.
//!
//! `StreamClient` and `StreamServer` wrap `std::net::TcpStream`/`TcpListener` directly —
//! both types are already move-only with `Drop`-based close, so there is no scoped-handle
//! wrapper to reimplement here (see `SPEC_FULL.md` §9, R3).

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use thiserror::Error;

/// Failure taxonomy for stream endpoint operations, shared by client and server variants.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to create socket: {0}")]
    BadSocket(#[source] std::io::Error),
    #[error("bind failed for {addr}: {source}")]
    BindFail {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("listen failed: {0}")]
    ListenFail(#[source] std::io::Error),
    #[error("connect failed to {addr}: {source}")]
    ConnectFail {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("accept failed: {0}")]
    AcceptFail(#[source] std::io::Error),
    #[error("send failed: {0}")]
    SendFail(#[source] std::io::Error),
    #[error("recv failed: {0}")]
    RecvFail(#[source] std::io::Error),
    #[error("invalid ip address: {0}")]
    InvalidIp(String),
}

/// Client endpoint. Owns exactly one connected `TcpStream`.
pub struct StreamClient {
    stream: TcpStream,
}

impl StreamClient {
    /// Parse `ip`/`port`, create a stream socket, and connect.
    pub fn connect(ip: &str, port: u16) -> Result<Self, StreamError> {
        let addr = format!("{ip}:{port}");
        let socket_addr: std::net::SocketAddr = addr
            .parse()
            .map_err(|_| StreamError::InvalidIp(ip.to_string()))?;

        let stream = TcpStream::connect(socket_addr).map_err(|source| StreamError::ConnectFail {
            addr: addr.clone(),
            source,
        })?;

        Ok(Self { stream })
    }

    /// A single blocking recv into `buf`, passed through to the OS verbatim. Whatever
    /// the kernel hands back — a full record, a fragment, or `0` on a clean close — is
    /// returned as-is; framing and short-read handling are the caller's responsibility
    /// (§4.2.1, §4.3 step 2).
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.stream.read(buf).map_err(StreamError::RecvFail)
    }

    /// Write all of `buf`. `TcpStream::write_all` already suppresses `SIGPIPE`
    /// process-wide on this platform, so no `MSG_NOSIGNAL`-equivalent is needed.
    pub fn send(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        self.stream.write_all(buf).map_err(StreamError::SendFail)
    }
}

/// Server endpoint. Owns a listening socket and hands out one client stream at a time.
pub struct StreamServer {
    listener: TcpListener,
}

impl StreamServer {
    /// Bind `ip`/`port` and start listening (backlog handled by the platform default,
    /// matching the source's backlog-10 `listen()` call closely enough for this core's
    /// single-client-at-a-time usage).
    pub fn start(ip: &str, port: u16) -> Result<Self, StreamError> {
        let addr = format!("{ip}:{port}");
        let listener = TcpListener::bind(&addr).map_err(|source| StreamError::BindFail {
            addr: addr.clone(),
            source,
        })?;

        Ok(Self { listener })
    }

    /// Block until a client connects.
    pub fn accept_client(&self) -> Result<StreamClient, StreamError> {
        let (stream, _peer) = self.listener.accept().map_err(StreamError::AcceptFail)?;
        Ok(StreamClient { stream })
    }
}
