//! Scripted frame sources, decoders, and sinks for driving the loops.

use std::{collections::VecDeque, convert::Infallible, error::Error, fmt, io};

use async_trait::async_trait;
use bytes::Bytes;
use imagestream::{FrameSource, ImageDecoder, ImageId, ImageSink};
use tokio::sync::oneshot;

/// Yields a fixed list of frames, then signals exhaustion and stalls.
///
/// Pair it with the receiver half returned by [`ScriptedSource::new`] as the
/// shutdown future to stop a sender loop once every frame has been captured.
#[derive(Debug)]
pub struct ScriptedSource {
    frames: VecDeque<Bytes>,
    exhausted: Option<oneshot::Sender<()>>,
}

impl ScriptedSource {
    /// Create a source and the signal fired when it runs dry.
    pub fn new(frames: impl IntoIterator<Item = Bytes>) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let source = Self {
            frames: frames.into_iter().collect(),
            exhausted: Some(tx),
        };
        (source, rx)
    }
}

#[async_trait]
impl FrameSource for ScriptedSource {
    type Frame = Bytes;
    type Error = Infallible;

    async fn capture(&mut self) -> Result<Bytes, Infallible> {
        if let Some(frame) = self.frames.pop_front() {
            return Ok(frame);
        }
        if let Some(tx) = self.exhausted.take() {
            let _ = tx.send(());
        }
        std::future::pending().await
    }
}

/// Error returned by [`RejectingDecoder`].
#[derive(Debug)]
pub struct Undecodable;

impl fmt::Display for Undecodable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("not an image") }
}

impl Error for Undecodable {}

/// Decoder rejecting every image whose first byte equals a marker.
#[derive(Clone, Copy, Debug)]
pub struct RejectingDecoder {
    pub marker: u8,
}

impl ImageDecoder for RejectingDecoder {
    type Frame = Bytes;
    type Error = Undecodable;

    fn decode(&mut self, image: Bytes) -> Result<Bytes, Undecodable> {
        if image.first() == Some(&self.marker) {
            Err(Undecodable)
        } else {
            Ok(image)
        }
    }
}

/// Sink recording delivered images and reported decode failures.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub images: Vec<(ImageId, Bytes)>,
    pub decode_failures: Vec<ImageId>,
    capacity: Option<usize>,
}

impl RecordingSink {
    /// Create a sink that accepts any number of images.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a sink that errors once it holds `capacity` images.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Identifiers of the delivered images, in delivery order.
    #[must_use]
    pub fn ids(&self) -> Vec<u8> { self.images.iter().map(|(id, _)| id.get()).collect() }
}

#[async_trait]
impl ImageSink for RecordingSink {
    type Frame = Bytes;
    type Error = io::Error;

    async fn on_image_ready(&mut self, image_id: ImageId, frame: Bytes) -> io::Result<()> {
        if self.capacity.is_some_and(|cap| self.images.len() >= cap) {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "sink full"));
        }
        self.images.push((image_id, frame));
        Ok(())
    }

    fn on_decode_error(&mut self, image_id: ImageId, _error: &(dyn Error + Send + Sync)) {
        self.decode_failures.push(image_id);
    }
}
