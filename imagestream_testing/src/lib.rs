//! Test support for `imagestream`.
//!
//! Provides an in-memory datagram link whose traffic can be reordered,
//! dropped, or duplicated, scripted collaborators for the sender and receiver
//! loops, deterministic payloads, and serialised log capture.
//!
//! ```rust
//! use imagestream::{ImageSender, StreamConfig};
//! use imagestream_testing::{MemoryLink, patterned};
//!
//! # async fn example() {
//! let config = StreamConfig::new(16).unwrap();
//! let mut sender = ImageSender::new(&config, MemoryLink::new());
//! sender.send_image(patterned(40, 1)).await.unwrap();
//! let traffic = sender.into_sink().into_traffic().reversed();
//! assert_eq!(traffic.len(), 4);
//! # }
//! ```

pub mod collaborators;
pub mod link;
pub mod logging;
pub mod payload;

pub use collaborators::{RecordingSink, RejectingDecoder, ScriptedSource, Undecodable};
pub use link::{MemoryLink, Traffic};
pub use logging::{LoggerHandle, logger};
pub use payload::{marked, patterned};
