//! Error types emitted by the chunking layer.
//!
//! Header and index corruption are recoverable: the receiver discards the
//! offending datagram and keeps going. Only the sender can fail outright, when
//! an image is too large to address with two-byte chunk ids.

use thiserror::Error;

use super::{ChunkCount, ChunkId, ImageId};

/// Header field named in [`HeaderError::FieldOverflow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum HeaderField {
    /// The one-byte image id.
    #[display("image id")]
    ImageId,
    /// The two-byte chunk id.
    #[display("chunk id")]
    ChunkId,
    /// The two-byte chunk count.
    #[display("chunk count")]
    ChunkCount,
}

/// Errors produced while encoding or decoding a chunk header.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// The datagram is shorter than the fixed header.
    #[error("truncated header: {len} bytes, need {needed}")]
    Truncated { len: usize, needed: usize },
    /// A raw field value does not fit its wire width.
    #[error("{field} {value} exceeds maximum {max}")]
    FieldOverflow {
        field: HeaderField,
        value: u32,
        max: u32,
    },
}

/// Errors produced while fragmenting outbound images.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The image needs more chunks than a chunk id can address.
    #[error("image of {len} bytes needs {required} chunks, limit is {max}")]
    TooManyChunks {
        len: usize,
        required: usize,
        max: ChunkCount,
    },
}

/// Why the reassembler dropped an inbound datagram without using it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// The datagram could not hold a full header.
    TruncatedHeader,
    /// The chunk id lies outside `[0, chunk_count)`.
    CorruptChunkIndex,
    /// The chunk announces a different total than the image being accumulated.
    ChunkCountMismatch,
    /// The chunk belongs to an image that was already superseded.
    StaleImage,
}

impl DiscardReason {
    /// Stable label used for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TruncatedHeader => "truncated_header",
            Self::CorruptChunkIndex => "corrupt_chunk_index",
            Self::ChunkCountMismatch => "chunk_count_mismatch",
            Self::StaleImage => "stale_image",
        }
    }
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Errors produced by [`Reassembler`](crate::chunk::Reassembler).
///
/// Every variant is recoverable; the receive loop logs it and continues with
/// the next datagram.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The datagram header could not be decoded.
    #[error(transparent)]
    Header(#[from] HeaderError),
    /// The chunk index does not fit the announced chunk count.
    #[error("chunk {chunk_id} of image {image_id} is outside chunk count {chunk_count}")]
    CorruptChunkIndex {
        image_id: ImageId,
        chunk_id: ChunkId,
        chunk_count: ChunkCount,
    },
    /// The chunk count disagrees with the image being accumulated.
    #[error("image {image_id} announced {expected} chunks, chunk claims {found}")]
    ChunkCountMismatch {
        image_id: ImageId,
        expected: ChunkCount,
        found: ChunkCount,
    },
    /// The chunk belongs to an image older than the one being accumulated.
    #[error("stale chunk for image {image_id} while accumulating image {tracked}")]
    StaleImage { image_id: ImageId, tracked: ImageId },
}

impl ReassemblyError {
    /// Classify the error for logging and metrics.
    #[must_use]
    pub const fn reason(&self) -> DiscardReason {
        match self {
            Self::Header(_) => DiscardReason::TruncatedHeader,
            Self::CorruptChunkIndex { .. } => DiscardReason::CorruptChunkIndex,
            Self::ChunkCountMismatch { .. } => DiscardReason::ChunkCountMismatch,
            Self::StaleImage { .. } => DiscardReason::StaleImage,
        }
    }
}
