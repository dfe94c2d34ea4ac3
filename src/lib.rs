#![doc(html_root_url = "https://docs.rs/imagestream/latest")]
//! Public API for the `imagestream` library.
//!
//! The crate streams compressed images over a lossy datagram transport. Each
//! image is split into chunks that fit an MTU budget, every chunk carries a
//! five-byte header, and the receiver rebuilds images from chunks that may
//! arrive out of order, twice, or not at all. There is no retransmission: a
//! newer image arriving before the current one completes drops the old one.

pub mod byte_order;
pub mod chunk;
pub mod codec;
pub mod config;
pub mod files;
pub mod metrics;
pub mod receiver;
pub mod sender;
pub mod transport;

pub use chunk::{
    Chunk,
    ChunkBatch,
    ChunkCount,
    ChunkHeader,
    ChunkId,
    CompletedImage,
    DiscardReason,
    FragmentationError,
    Fragmenter,
    HEADER_LEN,
    HeaderError,
    ImageId,
    Reassembler,
    ReassemblyError,
    ReassemblyStats,
    SupersessionPolicy,
    split_datagram,
};
pub use codec::{FrameSource, ImageDecoder, ImageEncoder, ImageSink, Passthrough};
pub use config::{ConfigError, StreamConfig};
pub use receiver::{ImageReceiver, ReceiveError, decode_images};
pub use sender::{ImageSender, SendError};
pub use transport::{DatagramSink, UdpReceiver, UdpSender};
