//! Outbound helper that splits encoded images into datagram-sized chunks.
//!
//! [`Fragmenter`] owns the sender's image id counter. Each call to
//! [`Fragmenter::fragment`] claims the next [`ImageId`] and returns a lazy
//! [`ChunkBatch`] that slices the payload on demand, so no chunk payload is
//! copied until the datagram itself is built.

use std::num::NonZeroUsize;

use bytes::{BufMut, Bytes, BytesMut};

use super::{ChunkCount, ChunkHeader, ChunkId, FragmentationError, HEADER_LEN, ImageId};

/// Splits encoded images into chunks no larger than a fixed payload size.
#[derive(Debug)]
pub struct Fragmenter {
    max_chunk_payload: NonZeroUsize,
    next_image_id: ImageId,
}

impl Fragmenter {
    /// Create a fragmenter whose chunk payloads hold at most `max_chunk_payload` bytes.
    #[must_use]
    pub const fn new(max_chunk_payload: NonZeroUsize) -> Self {
        Self::with_starting_id(max_chunk_payload, ImageId::new(0))
    }

    /// Create a fragmenter whose first image uses `start_at`.
    #[must_use]
    pub const fn with_starting_id(max_chunk_payload: NonZeroUsize, start_at: ImageId) -> Self {
        Self {
            max_chunk_payload,
            next_image_id: start_at,
        }
    }

    /// Return the maximum chunk payload size in bytes.
    #[must_use]
    pub const fn max_chunk_payload(&self) -> NonZeroUsize { self.max_chunk_payload }

    /// Return the id the next fragmented image will carry.
    #[must_use]
    pub const fn next_image_id(&self) -> ImageId { self.next_image_id }

    /// Number of chunks needed to carry `len` payload bytes.
    #[must_use]
    pub const fn chunks_needed(&self, len: usize) -> usize {
        len.div_ceil(self.max_chunk_payload.get())
    }

    /// Split `payload` into chunks tagged with the next image id.
    ///
    /// The image id counter advances once per call, wrapping after `255`. An
    /// empty payload yields a batch with a chunk count of zero and no chunks;
    /// its id is still consumed.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::TooManyChunks`] if the payload needs more
    /// than [`ChunkCount::MAX`] chunks. The id counter is left untouched.
    pub fn fragment(&mut self, payload: impl Into<Bytes>) -> Result<ChunkBatch, FragmentationError> {
        let payload = payload.into();
        let required = self.chunks_needed(payload.len());
        let chunk_count =
            ChunkCount::try_from(required).map_err(|_| FragmentationError::TooManyChunks {
                len: payload.len(),
                required,
                max: ChunkCount::MAX,
            })?;

        let image_id = self.next_image_id;
        self.next_image_id = image_id.next();
        Ok(ChunkBatch {
            image_id,
            chunk_count,
            max_chunk_payload: self.max_chunk_payload.get(),
            payload,
            next: 0,
        })
    }
}

/// A single outbound chunk: header plus a slice of the image payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    header: ChunkHeader,
    payload: Bytes,
}

impl Chunk {
    /// Construct a chunk from its parts.
    #[must_use]
    pub fn new(header: ChunkHeader, payload: Bytes) -> Self { Self { header, payload } }

    /// Return the chunk header.
    #[must_use]
    pub fn header(&self) -> &ChunkHeader { &self.header }

    /// Return the chunk payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Length of the encoded datagram.
    #[must_use]
    pub fn datagram_len(&self) -> usize { HEADER_LEN + self.payload.len() }

    /// Encode the chunk as a datagram: header followed by payload.
    #[must_use]
    pub fn to_datagram(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.datagram_len());
        self.header.write_to(&mut buf);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Consume the chunk, returning its components.
    #[must_use]
    pub fn into_parts(self) -> (ChunkHeader, Bytes) { (self.header, self.payload) }
}

/// Lazy, finite sequence of chunks for one image.
///
/// Chunks are produced in id order `0..chunk_count`. The batch is not
/// restartable; clone it before iterating to walk the chunks twice.
#[derive(Clone, Debug)]
pub struct ChunkBatch {
    image_id: ImageId,
    chunk_count: ChunkCount,
    max_chunk_payload: usize,
    payload: Bytes,
    next: usize,
}

impl ChunkBatch {
    /// Return the image id shared by all chunks.
    #[must_use]
    pub const fn image_id(&self) -> ImageId { self.image_id }

    /// Return the number of chunks the image was split into.
    #[must_use]
    pub const fn chunk_count(&self) -> ChunkCount { self.chunk_count }

    /// Total payload length of the image.
    #[must_use]
    pub fn payload_len(&self) -> usize { self.payload.len() }
}

impl Iterator for ChunkBatch {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.chunk_count.as_usize() {
            return None;
        }
        let chunk_id = ChunkId::try_from(self.next).ok()?;
        let start = self.next * self.max_chunk_payload;
        let end = (start + self.max_chunk_payload).min(self.payload.len());
        self.next += 1;
        Some(Chunk::new(
            ChunkHeader::new(self.image_id, chunk_id, self.chunk_count),
            self.payload.slice(start..end),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.chunk_count.as_usize().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkBatch {}
