//! In-memory stand-in for a lossy datagram network.
//!
//! [`MemoryLink`] records what a sender emits. The captured datagrams can then
//! be reordered, dropped, or duplicated before being replayed to a receiver as
//! a stream, reproducing what UDP may do to them deterministically.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use imagestream::DatagramSink;

/// Datagram sink that stores every datagram in memory.
#[derive(Debug, Default)]
pub struct MemoryLink {
    datagrams: Vec<Bytes>,
    fail_after: Option<usize>,
}

impl MemoryLink {
    /// Create a link that accepts every datagram.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a link that accepts `accepted` datagrams and then fails.
    #[must_use]
    pub fn failing_after(accepted: usize) -> Self {
        Self {
            datagrams: Vec::new(),
            fail_after: Some(accepted),
        }
    }

    /// Datagrams accepted so far, in send order.
    #[must_use]
    pub fn datagrams(&self) -> &[Bytes] { &self.datagrams }

    /// Take the captured datagrams for replay.
    #[must_use]
    pub fn into_traffic(self) -> Traffic { Traffic(self.datagrams) }
}

#[async_trait]
impl DatagramSink for MemoryLink {
    async fn send_datagram(&mut self, datagram: Bytes) -> io::Result<()> {
        if self.fail_after.is_some_and(|limit| self.datagrams.len() >= limit) {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "link down"));
        }
        self.datagrams.push(datagram);
        Ok(())
    }
}

/// Captured datagrams awaiting delivery.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Traffic(pub Vec<Bytes>);

impl Traffic {
    /// Number of datagrams in flight.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Deliver datagrams in reverse send order.
    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.0.reverse();
        self
    }

    /// Lose the datagrams at `indices` (send order).
    #[must_use]
    pub fn dropping(self, indices: &[usize]) -> Self {
        Self(
            self.0
                .into_iter()
                .enumerate()
                .filter_map(|(i, d)| (!indices.contains(&i)).then_some(d))
                .collect(),
        )
    }

    /// Deliver the datagram at `index` twice in a row.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn duplicating(mut self, index: usize) -> Self {
        let copy = self.0[index].clone();
        self.0.insert(index + 1, copy);
        self
    }

    /// Deliver datagrams in the order given by `order`, which indexes the
    /// current sequence.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range.
    #[must_use]
    pub fn reordered(self, order: &[usize]) -> Self {
        Self(order.iter().map(|&i| self.0[i].clone()).collect())
    }

    /// Append another batch of traffic after this one.
    #[must_use]
    pub fn then(mut self, other: Traffic) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Replay the datagrams as a receiver input stream that then ends.
    #[must_use]
    pub fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        stream::iter(self.0.into_iter().map(Ok)).boxed()
    }

    /// Replay the datagrams, then fail with `kind`.
    #[must_use]
    pub fn into_stream_then_error(self, kind: io::ErrorKind) -> BoxStream<'static, io::Result<Bytes>> {
        stream::iter(self.0.into_iter().map(Ok))
            .chain(stream::once(async move { Err(io::Error::from(kind)) }))
            .boxed()
    }
}
