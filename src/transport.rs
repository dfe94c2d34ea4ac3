//! Datagram transport adapters.
//!
//! The chunking layer only needs two primitives: send one datagram, and
//! receive datagrams one at a time. [`DatagramSink`] abstracts the first so
//! senders can be driven over UDP or an in-memory link; the receive side is
//! any `Stream` of datagrams, such as the one produced by
//! [`UdpReceiver::into_stream`].
//!
//! Neither side retries or acknowledges anything. Datagrams may be dropped,
//! duplicated, or reordered in transit.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use log::{debug, info, warn};
use tokio::net::UdpSocket;

/// Destination for outbound datagrams.
///
/// Implementations must deliver each datagram as a single message or report
/// an error; partial sends are errors.
#[async_trait]
pub trait DatagramSink: Send {
    /// Send one datagram.
    async fn send_datagram(&mut self, datagram: Bytes) -> io::Result<()>;
}

#[async_trait]
impl<T: DatagramSink + ?Sized> DatagramSink for Box<T> {
    async fn send_datagram(&mut self, datagram: Bytes) -> io::Result<()> {
        (**self).send_datagram(datagram).await
    }
}

/// Sends datagrams to a single peer over UDP.
///
/// The socket stays unconnected so ICMP port-unreachable replies from a peer
/// that is not listening yet never surface as send errors.
#[derive(Debug)]
pub struct UdpSender {
    socket: UdpSocket,
    peer: SocketAddr,
    mtu_budget: usize,
}

impl UdpSender {
    /// Bind `local` and direct all datagrams to `peer`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while binding the socket.
    pub async fn connect(local: SocketAddr, peer: SocketAddr, mtu_budget: usize) -> io::Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        info!("UDP sender bound to {} streaming to {peer}", socket.local_addr()?);
        Ok(Self {
            socket,
            peer,
            mtu_budget,
        })
    }

    /// Address the sender is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }

    /// Address of the receiving peer.
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr { self.peer }
}

#[async_trait]
impl DatagramSink for UdpSender {
    async fn send_datagram(&mut self, datagram: Bytes) -> io::Result<()> {
        if datagram.len() > self.mtu_budget {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "datagram of {} bytes exceeds MTU budget of {}",
                    datagram.len(),
                    self.mtu_budget
                ),
            ));
        }
        let sent = self.socket.send_to(&datagram, self.peer).await?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} bytes", datagram.len()),
            ));
        }
        Ok(())
    }
}

/// Receives datagrams on a bound UDP socket.
#[derive(Debug)]
pub struct UdpReceiver {
    socket: UdpSocket,
    mtu_budget: usize,
}

impl UdpReceiver {
    /// Bind a receiver to `addr`.
    ///
    /// Datagrams longer than `mtu_budget` are dropped on receipt.
    ///
    /// # Errors
    ///
    /// Returns any error raised while binding the socket.
    pub async fn bind(addr: SocketAddr, mtu_budget: usize) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!("UDP receiver bound to {}", socket.local_addr()?);
        Ok(Self { socket, mtu_budget })
    }

    /// Address the receiver is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }

    /// Wait for the next datagram that fits the MTU budget.
    ///
    /// Oversized datagrams would arrive truncated, so they are logged and
    /// skipped rather than returned.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the socket.
    pub async fn recv_datagram(&self) -> io::Result<Bytes> {
        loop {
            // One spare byte reveals datagrams the socket had to cut short.
            let mut buf = BytesMut::zeroed(self.mtu_budget + 1);
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            if len > self.mtu_budget {
                warn!(
                    "dropping datagram from {from}: exceeds MTU budget of {}",
                    self.mtu_budget
                );
                continue;
            }
            buf.truncate(len);
            debug!("received {len} bytes from {from}");
            return Ok(buf.freeze());
        }
    }

    /// Turn the receiver into an endless stream of datagrams.
    ///
    /// The stream never ends on its own; drop it to release the socket.
    #[must_use]
    pub fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        stream::unfold(self, |receiver| async move {
            let datagram = receiver.recv_datagram().await;
            Some((datagram, receiver))
        })
        .boxed()
    }
}
