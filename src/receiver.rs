//! Receiver loop: datagrams in, complete images out.
//!
//! [`ImageReceiver`] feeds every datagram into its [`Reassembler`]. Header and
//! index corruption are skipped where they occur, so the stream returned by
//! [`ImageReceiver::images`] only yields complete images or a terminal
//! transport error. Decoding happens downstream in [`decode_images`], where a
//! bad image becomes a per-image error and the stream keeps going.

use std::{future::Future, io};

use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use log::{info, warn};
use thiserror::Error;
use tokio::{select, signal};

use crate::{
    chunk::{CompletedImage, ImageId, Reassembler, ReassemblyStats},
    codec::{BoxError, ImageDecoder, ImageSink},
    config::StreamConfig,
    metrics,
};

/// Errors surfaced by the receive side.
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// The datagram source failed or closed; ends the stream.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    /// A reassembled image could not be decoded; later images are unaffected.
    #[error("failed to decode image {image_id}: {source}")]
    Decode {
        image_id: ImageId,
        #[source]
        source: BoxError,
    },
    /// The image sink refused an image; ends the receive loop.
    #[error("image sink failed: {0}")]
    Sink(#[source] BoxError),
}

impl ReceiveError {
    /// Whether the error ends the receive loop.
    #[must_use]
    pub fn is_fatal(&self) -> bool { !matches!(self, Self::Decode { .. }) }
}

/// Turns a stream of datagrams into a stream of complete images.
#[derive(Debug, Default)]
pub struct ImageReceiver {
    reassembler: Reassembler,
}

impl ImageReceiver {
    /// Create an idle receiver using the supersession policy from `config`.
    #[must_use]
    pub fn new(config: &StreamConfig) -> Self { Self::with_reassembler(config.reassembler()) }

    /// Create a receiver around an existing reassembler.
    #[must_use]
    pub fn with_reassembler(reassembler: Reassembler) -> Self { Self { reassembler } }

    /// Borrow the underlying reassembler.
    #[must_use]
    pub fn reassembler(&self) -> &Reassembler { &self.reassembler }

    /// Running reassembly totals.
    #[must_use]
    pub fn stats(&self) -> ReassemblyStats { self.reassembler.stats() }

    /// Process one datagram, returning the image it completes, if any.
    ///
    /// Discarded datagrams are counted and logged by the reassembler.
    pub fn accept(&mut self, datagram: Bytes) -> Option<CompletedImage> {
        self.reassembler.push_datagram(datagram).ok().flatten()
    }

    /// Lazily reassemble images from `datagrams`.
    ///
    /// The returned stream yields each complete image as soon as its last
    /// chunk arrives. It ends when `datagrams` ends, or after yielding a
    /// single [`ReceiveError::Transport`] for the first transport failure.
    pub fn images<'a, D>(
        &'a mut self,
        datagrams: D,
    ) -> impl Stream<Item = Result<CompletedImage, ReceiveError>> + Send + 'a
    where
        D: Stream<Item = io::Result<Bytes>> + Send + Unpin + 'a,
    {
        stream::unfold(Some((self, datagrams)), |state| async move {
            let (receiver, mut datagrams) = state?;
            loop {
                match datagrams.next().await? {
                    Ok(datagram) => {
                        if let Some(image) = receiver.accept(datagram) {
                            return Some((Ok(image), Some((receiver, datagrams))));
                        }
                    }
                    Err(err) => {
                        metrics::inc_errors();
                        return Some((Err(ReceiveError::Transport(err)), None));
                    }
                }
            }
        })
    }

    /// Reassemble, decode, and hand images to `sink` until Ctrl+C is received.
    ///
    /// # Errors
    ///
    /// See [`ImageReceiver::run_with_shutdown`].
    pub async fn run<D, Dec, S>(
        &mut self,
        datagrams: D,
        decoder: Dec,
        sink: &mut S,
    ) -> Result<u64, ReceiveError>
    where
        D: Stream<Item = io::Result<Bytes>> + Send + Unpin,
        Dec: ImageDecoder,
        S: ImageSink<Frame = Dec::Frame>,
    {
        self.run_with_shutdown(datagrams, decoder, sink, async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Reassemble, decode, and hand images to `sink` until `shutdown` resolves.
    ///
    /// Decode failures are reported to [`ImageSink::on_decode_error`] and the
    /// loop continues. Returns the number of images delivered to the sink.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError::Transport`] when the datagram source fails and
    /// [`ReceiveError::Sink`] when the sink rejects an image.
    pub async fn run_with_shutdown<D, Dec, S, Sh>(
        &mut self,
        datagrams: D,
        decoder: Dec,
        sink: &mut S,
        shutdown: Sh,
    ) -> Result<u64, ReceiveError>
    where
        D: Stream<Item = io::Result<Bytes>> + Send + Unpin,
        Dec: ImageDecoder,
        S: ImageSink<Frame = Dec::Frame>,
        Sh: Future<Output = ()> + Send,
    {
        let mut delivered = 0_u64;
        {
            let frames = decode_images(self.images(datagrams), decoder);
            tokio::pin!(frames);
            tokio::pin!(shutdown);

            loop {
                let next = select! {
                    biased;
                    () = &mut shutdown => break,
                    next = frames.next() => next,
                };
                match next {
                    None => break,
                    Some(Ok((image_id, frame))) => {
                        sink.on_image_ready(image_id, frame)
                            .await
                            .map_err(|err| ReceiveError::Sink(Box::new(err)))?;
                        delivered += 1;
                    }
                    Some(Err(ReceiveError::Decode { image_id, source })) => {
                        sink.on_decode_error(image_id, source.as_ref());
                    }
                    Some(Err(err)) => return Err(err),
                }
            }
        }

        let stats = self.stats();
        info!(
            "receiver stopped: delivered={delivered} frame_drops={} stale={} corrupt={} \
             truncated={}",
            stats.frame_drops, stats.stale, stats.corrupt, stats.truncated
        );
        Ok(delivered)
    }
}

/// Decode every complete image from `images` with `decoder`.
///
/// Decode failures become [`ReceiveError::Decode`] items; the stream keeps
/// going. Other errors pass through unchanged.
pub fn decode_images<S, Dec>(
    images: S,
    mut decoder: Dec,
) -> impl Stream<Item = Result<(ImageId, Dec::Frame), ReceiveError>>
where
    S: Stream<Item = Result<CompletedImage, ReceiveError>>,
    Dec: ImageDecoder,
{
    images.map(move |item| {
        let image = item?;
        let image_id = image.image_id();
        match decoder.decode(image.into_payload()) {
            Ok(frame) => Ok((image_id, frame)),
            Err(err) => {
                metrics::inc_errors();
                warn!("dropping undecodable image: image_id={image_id} error={err}");
                Err(ReceiveError::Decode {
                    image_id,
                    source: Box::new(err),
                })
            }
        }
    })
}
