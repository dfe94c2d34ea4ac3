//! Sender loop: capture, encode, fragment, send.
//!
//! [`ImageSender`] owns the [`Fragmenter`] and the datagram sink. Sending is
//! best-effort: the first transport failure aborts the current image and is
//! returned to the caller, and nothing is retried.

use std::{future::Future, io};

use bytes::Bytes;
use log::{debug, info};
use thiserror::Error;
use tokio::{select, signal};

use crate::{
    chunk::{ChunkId, FragmentationError, Fragmenter, ImageId},
    codec::{BoxError, FrameSource, ImageEncoder},
    config::StreamConfig,
    metrics::{self, Direction},
    transport::DatagramSink,
};

/// Errors that stop an image from being sent.
#[derive(Debug, Error)]
pub enum SendError {
    /// The frame source failed to produce a frame.
    #[error("failed to capture frame: {0}")]
    Capture(#[source] BoxError),
    /// The encoder rejected a frame.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] BoxError),
    /// The encoded image cannot be addressed with two-byte chunk ids.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// The transport refused a chunk.
    #[error("transport error sending chunk {chunk_id} of image {image_id}: {source}")]
    Transport {
        image_id: ImageId,
        chunk_id: ChunkId,
        #[source]
        source: io::Error,
    },
}

/// Fragments encoded images and pushes their chunks into a [`DatagramSink`].
#[derive(Debug)]
pub struct ImageSender<S> {
    fragmenter: Fragmenter,
    sink: S,
}

impl<S: DatagramSink> ImageSender<S> {
    /// Create a sender sized by `config`, starting at image id `0`.
    #[must_use]
    pub fn new(config: &StreamConfig, sink: S) -> Self {
        Self::with_fragmenter(config.fragmenter(), sink)
    }

    /// Create a sender around an existing fragmenter.
    #[must_use]
    pub fn with_fragmenter(fragmenter: Fragmenter, sink: S) -> Self { Self { fragmenter, sink } }

    /// Id that the next image will carry.
    #[must_use]
    pub const fn next_image_id(&self) -> ImageId { self.fragmenter.next_image_id() }

    /// Borrow the underlying sink.
    #[must_use]
    pub const fn sink(&self) -> &S { &self.sink }

    /// Consume the sender, returning the sink.
    #[must_use]
    pub fn into_sink(self) -> S { self.sink }

    /// Fragment `payload` and send every chunk in id order.
    ///
    /// Returns the id assigned to the image. The id is consumed even when
    /// sending fails part way through.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Fragmentation`] when the payload is too large and
    /// [`SendError::Transport`] when the sink rejects a chunk.
    pub async fn send_image(&mut self, payload: impl Into<Bytes>) -> Result<ImageId, SendError> {
        let batch = self.fragmenter.fragment(payload)?;
        let image_id = batch.image_id();
        let chunk_count = batch.chunk_count();
        let len = batch.payload_len();

        for chunk in batch {
            let chunk_id = chunk.header().chunk_id();
            if let Err(source) = self.sink.send_datagram(chunk.to_datagram()).await {
                metrics::inc_errors();
                return Err(SendError::Transport {
                    image_id,
                    chunk_id,
                    source,
                });
            }
            metrics::inc_chunks(Direction::Outbound);
        }

        metrics::inc_images_sent();
        debug!("image sent: image_id={image_id} chunks={chunk_count} bytes={len}");
        Ok(image_id)
    }

    /// Stream frames from `source` until Ctrl+C is received.
    ///
    /// # Errors
    ///
    /// See [`ImageSender::run_with_shutdown`].
    pub async fn run<F, E>(&mut self, source: &mut F, encoder: &mut E) -> Result<u64, SendError>
    where
        F: FrameSource,
        E: ImageEncoder<Frame = F::Frame>,
    {
        self.run_with_shutdown(source, encoder, async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Stream frames from `source` until `shutdown` resolves.
    ///
    /// Each iteration captures one frame, encodes it, and sends it as one
    /// image. Only the capture step is interrupted by `shutdown`; an image
    /// already being sent is sent in full. Returns the number of images sent.
    ///
    /// # Errors
    ///
    /// Returns the first capture, encode, fragmentation, or transport failure.
    pub async fn run_with_shutdown<F, E, Sh>(
        &mut self,
        source: &mut F,
        encoder: &mut E,
        shutdown: Sh,
    ) -> Result<u64, SendError>
    where
        F: FrameSource,
        E: ImageEncoder<Frame = F::Frame>,
        Sh: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        let mut sent = 0_u64;

        loop {
            let frame = select! {
                biased;
                () = &mut shutdown => break,
                frame = source.capture() => frame.map_err(|err| SendError::Capture(Box::new(err)))?,
            };
            let payload = encoder
                .encode(&frame)
                .map_err(|err| SendError::Encode(Box::new(err)))?;
            self.send_image(payload).await?;
            sent += 1;
        }

        info!("sender stopped after {sent} images");
        Ok(sent)
    }
}
