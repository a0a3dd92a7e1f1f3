//! Socket Layer
//!
//! Listening socket with a non-blocking "anything pending?" accept.

use std::future::{Future, poll_fn};
use std::net::{IpAddr, SocketAddr};
use std::task::Poll;

use tokio::net::{TcpListener, TcpSocket};

use crate::error::{DispatchError, DispatchResult};
use crate::transport::{ConnectionTransport, TcpTransport};

/// Source of newly accepted connections
pub trait ConnectionSource {
    type Transport: ConnectionTransport;

    /// Accept one pending connection, or return `None` without waiting
    fn try_accept(&mut self) -> impl Future<Output = DispatchResult<Option<Self::Transport>>>;
}

/// Non-blocking TCP listener
pub struct TcpConnectionSource {
    listener: TcpListener,
}

impl TcpConnectionSource {
    /// Create, bind and listen on `addr:port` with the given backlog
    ///
    /// Must be called from inside a tokio runtime. Failures map to
    /// `ErrorKind::Init`.
    pub fn bind(addr: &str, port: u16, backlog: u32) -> DispatchResult<Self> {
        let ip: IpAddr = addr.parse().map_err(|source| DispatchError::InvalidAddress {
            addr: addr.to_string(),
            source,
        })?;
        let addr = SocketAddr::new(ip, port);
        let listen_err = |source| DispatchError::Listen { addr, source };

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(listen_err)?;
        socket.set_reuseaddr(true).map_err(listen_err)?;
        socket.bind(addr).map_err(listen_err)?;
        let listener = socket.listen(backlog).map_err(listen_err)?;

        tracing::info!(%addr, backlog, "Listening");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> DispatchResult<SocketAddr> {
        self.listener.local_addr().map_err(DispatchError::Socket)
    }
}

impl ConnectionSource for TcpConnectionSource {
    type Transport = TcpTransport;

    async fn try_accept(&mut self) -> DispatchResult<Option<TcpTransport>> {
        let polled = poll_fn(|cx| match self.listener.poll_accept(cx) {
            Poll::Ready(result) => Poll::Ready(Some(result)),
            Poll::Pending => Poll::Ready(None),
        })
        .await;

        match polled {
            None => Ok(None),
            Some(Ok((stream, peer))) => {
                tracing::debug!(%peer, "Accepted connection");
                Ok(Some(TcpTransport::new(stream, peer.ip().to_string())))
            }
            Some(Err(e)) => Err(DispatchError::Socket(e)),
        }
    }
}
