//! Collaborator interfaces around the chunking layer.
//!
//! Capturing frames, compressing them, and displaying or storing the result
//! are outside this crate's concern. The sender and receiver loops talk to
//! those collaborators through the traits defined here.

use std::{convert::Infallible, error::Error};

use async_trait::async_trait;
use bytes::Bytes;
use log::warn;

use crate::chunk::ImageId;

/// Boxed error used when a collaborator failure crosses the loop boundary.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Produces raw frames, typically from a camera.
#[async_trait]
pub trait FrameSource: Send {
    /// Raw frame type.
    type Frame: Send;
    /// Error raised when a frame cannot be captured.
    type Error: Error + Send + Sync + 'static;

    /// Wait for and return the next frame.
    async fn capture(&mut self) -> Result<Self::Frame, Self::Error>;
}

/// Compresses raw frames into byte buffers ready for fragmentation.
pub trait ImageEncoder: Send {
    /// Raw frame type accepted by the encoder.
    type Frame;
    /// Error raised when a frame cannot be encoded.
    type Error: Error + Send + Sync + 'static;

    /// Encode `frame` into a compressed byte buffer.
    ///
    /// # Errors
    ///
    /// Returns the encoder's error when `frame` cannot be compressed.
    fn encode(&mut self, frame: &Self::Frame) -> Result<Bytes, Self::Error>;
}

/// Turns reassembled byte buffers back into frames.
pub trait ImageDecoder: Send {
    /// Frame type produced by the decoder.
    type Frame: Send;
    /// Error raised when a buffer is not a valid image.
    type Error: Error + Send + Sync + 'static;

    /// Decode a complete image buffer.
    ///
    /// # Errors
    ///
    /// Returns the decoder's error when `image` is not a valid encoding.
    fn decode(&mut self, image: Bytes) -> Result<Self::Frame, Self::Error>;
}

/// Consumer of decoded images.
#[async_trait]
pub trait ImageSink: Send {
    /// Frame type accepted by the sink.
    type Frame: Send;
    /// Error raised when the sink cannot accept an image; ends the receive loop.
    type Error: Error + Send + Sync + 'static;

    /// Handle one complete, decoded image.
    async fn on_image_ready(&mut self, image_id: ImageId, frame: Self::Frame)
    -> Result<(), Self::Error>;

    /// Observe an image that reassembled but failed to decode.
    ///
    /// The default implementation logs a warning.
    fn on_decode_error(&mut self, image_id: ImageId, error: &(dyn Error + Send + Sync)) {
        warn!("image decode failed: image_id={image_id} error={error}");
    }
}

/// Identity codec for payloads that are already encoded, such as JPEG files.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl ImageEncoder for Passthrough {
    type Frame = Bytes;
    type Error = Infallible;

    fn encode(&mut self, frame: &Bytes) -> Result<Bytes, Self::Error> { Ok(frame.clone()) }
}

impl ImageDecoder for Passthrough {
    type Frame = Bytes;
    type Error = Infallible;

    fn decode(&mut self, image: Bytes) -> Result<Bytes, Self::Error> { Ok(image) }
}
