//! Connection Transport
//!
//! The loop only ever talks to a client through [`ConnectionTransport`].
//! Every method is non-blocking: reads and writes move whatever the socket
//! will take right now and leave the rest buffered for the next tick.

use std::io;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::error::{DispatchError, DispatchResult};

/// Longest input line accepted before the client is dropped
pub const MAX_LINE_LEN: usize = 4096;

const READ_CHUNK: usize = 1024;

const DISCARD_CHUNKS: usize = 16;

/// Longest a closing connection waits for its queued output to drain
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Line-oriented, non-blocking view of one client connection
pub trait ConnectionTransport {
    /// False once the connection is fully closed
    ///
    /// A connection that is still draining output after `disconnect` counts
    /// as connected.
    fn is_connected(&self) -> bool;

    /// Textual peer IP, resolved at accept time
    fn peer_ip(&self) -> &str;

    /// Queue `text` plus a newline and push as much as possible to the peer
    fn send_text(&mut self, text: &str);

    /// Stop taking input and close once queued output has been sent
    fn disconnect(&mut self);

    /// Move pending bytes in both directions without blocking
    fn pump_io(&mut self) -> DispatchResult<()>;

    /// Take one complete input line, without its terminator
    fn next_line(&mut self) -> Option<String>;
}

/// [`ConnectionTransport`] over a tokio `TcpStream`
///
/// Uses `try_read`/`try_write` only, so the socket is driven by the runtime's
/// readiness tracking and never awaited.
///
/// Reading pauses while a complete line is buffered, so `inbound` never
/// holds more than [`MAX_LINE_LEN`] plus one read chunk.
pub struct TcpTransport {
    stream: Option<TcpStream>,
    peer_ip: String,
    inbound: Vec<u8>,
    outbound: Vec<u8>,
    /// Set by `disconnect`; the socket closes when output drains or this passes
    close_deadline: Option<Instant>,
}

impl TcpTransport {
    pub fn new(stream: TcpStream, peer_ip: impl Into<String>) -> Self {
        Self {
            stream: Some(stream),
            peer_ip: peer_ip.into(),
            inbound: Vec::new(),
            outbound: Vec::new(),
            close_deadline: None,
        }
    }

    fn is_closing(&self) -> bool {
        self.close_deadline.is_some()
    }

    fn close_now(&mut self) {
        // dropping the stream closes the socket
        self.stream = None;
        self.inbound.clear();
        self.outbound.clear();
    }

    /// Push remaining output; close once it is gone or the grace period ends
    fn drain_and_close(&mut self) {
        let Some(deadline) = self.close_deadline else {
            return;
        };

        if let Err(e) = self.flush_outbound() {
            e.log();
        }
        // unread input makes the close a reset, which can discard our output
        self.discard_inbound();

        if self.stream.is_none() || self.outbound.is_empty() || Instant::now() >= deadline {
            if !self.outbound.is_empty() {
                tracing::debug!(peer = %self.peer_ip, "Closing with unsent output");
            }
            self.close_now();
        }
    }

    /// Write buffered output until the socket would block
    fn flush_outbound(&mut self) -> DispatchResult<()> {
        let Some(stream) = &self.stream else {
            self.outbound.clear();
            return Ok(());
        };

        let mut written = 0;
        let result = loop {
            if written == self.outbound.len() {
                break Ok(());
            }
            match stream.try_write(&self.outbound[written..]) {
                Ok(0) => break Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };
        self.outbound.drain(..written);

        result.map_err(|e| {
            self.stream = None;
            DispatchError::Socket(e)
        })
    }

    /// Read and throw away whatever the peer has sent, a bounded amount per call
    fn discard_inbound(&mut self) {
        let Some(stream) = &self.stream else {
            return;
        };

        let mut chunk = [0u8; READ_CHUNK];
        for _ in 0..DISCARD_CHUNKS {
            match stream.try_read(&mut chunk) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
    }

    /// Read until the socket would block; `Ok(false)` when the peer closed
    fn fill_inbound(&mut self) -> DispatchResult<bool> {
        let Some(stream) = &self.stream else {
            return Ok(false);
        };

        let mut has_line = self.inbound.contains(&b'\n');
        let mut chunk = [0u8; READ_CHUNK];
        let result = loop {
            if has_line || self.inbound.len() > MAX_LINE_LEN {
                break Ok(true);
            }
            match stream.try_read(&mut chunk) {
                Ok(0) => break Ok(false),
                Ok(n) => {
                    has_line = chunk[..n].contains(&b'\n');
                    self.inbound.extend_from_slice(&chunk[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(true),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };

        match result {
            Ok(open) => {
                if !open {
                    self.stream = None;
                }
                Ok(open)
            }
            Err(e) => {
                self.stream = None;
                Err(DispatchError::Socket(e))
            }
        }
    }
}

impl ConnectionTransport for TcpTransport {
    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn peer_ip(&self) -> &str {
        &self.peer_ip
    }

    fn send_text(&mut self, text: &str) {
        if self.stream.is_none() || self.is_closing() {
            return;
        }
        self.outbound.extend_from_slice(text.as_bytes());
        self.outbound.push(b'\n');
        if let Err(e) = self.flush_outbound() {
            e.log();
        }
    }

    fn disconnect(&mut self) {
        if self.stream.is_none() || self.is_closing() {
            return;
        }
        self.inbound.clear();
        self.close_deadline = Some(Instant::now() + CLOSE_GRACE);
        self.drain_and_close();
    }

    fn pump_io(&mut self) -> DispatchResult<()> {
        if self.is_closing() {
            self.drain_and_close();
            return Ok(());
        }

        self.flush_outbound()?;
        self.fill_inbound()?;

        if self.inbound.len() > MAX_LINE_LEN && !self.inbound.contains(&b'\n') {
            tracing::warn!(peer = %self.peer_ip, "Input line too long, dropping connection");
            self.inbound.clear();
            self.stream = None;
        }
        Ok(())
    }

    fn next_line(&mut self) -> Option<String> {
        if self.is_closing() {
            return None;
        }
        split_line(&mut self.inbound)
    }
}

/// Remove the first `\n`-terminated line from `buf`, dropping a trailing `\r`
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn split_line(buf: &mut Vec<u8>) -> Option<String> {
    let end = buf.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buf.drain(..=end).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(String::from_utf8_lossy(&line).into_owned())
}
