//! Chunking primitives for streaming encoded images over datagrams.
//!
//! The sender side ([`Fragmenter`]) splits one encoded image into chunks that
//! each fit a single datagram. The receiver side ([`Reassembler`]) rebuilds
//! complete images from chunks that may arrive out of order, duplicated, or
//! not at all. Each sub-module focuses on a single concept; the public types
//! are re-exported here and at the crate root.

pub mod error;
pub mod fragmenter;
pub mod header;
pub mod id;
pub mod index;
pub mod reassembler;

pub use error::{DiscardReason, FragmentationError, HeaderError, HeaderField, ReassemblyError};
pub use fragmenter::{Chunk, ChunkBatch, Fragmenter};
pub use header::{ChunkHeader, HEADER_LEN, split_datagram};
pub use id::{ImageId, SupersessionPolicy};
pub use index::{ChunkCount, ChunkId};
pub use reassembler::{CompletedImage, ReassemblyStats, Reassembler};

#[cfg(test)]
mod tests;
