//! Fixed-width header carried at the front of every chunk datagram.
//!
//! The layout is big-endian with fixed offsets:
//!
//! ```text
//! [image_id: u8][chunk_id: u16 BE][chunk_count: u16 BE][payload...]
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::{ChunkCount, ChunkId, HeaderError, HeaderField, ImageId};
use crate::byte_order::{read_network_u16, write_network_u16};

/// Width of the image id field in bytes.
pub const IMAGE_ID_LEN: usize = 1;
/// Width of the chunk id and chunk count fields in bytes.
pub const CHUNK_FIELD_LEN: usize = 2;
/// Total header length; the payload starts at this offset.
pub const HEADER_LEN: usize = IMAGE_ID_LEN + 2 * CHUNK_FIELD_LEN;

const CHUNK_ID_OFFSET: usize = IMAGE_ID_LEN;
const CHUNK_COUNT_OFFSET: usize = IMAGE_ID_LEN + CHUNK_FIELD_LEN;

/// Header describing a single chunk.
///
/// # Examples
///
/// ```
/// use imagestream::chunk::{ChunkCount, ChunkHeader, ChunkId, ImageId};
/// let header = ChunkHeader::new(ImageId::new(7), ChunkId::new(1), ChunkCount::new(3));
/// assert_eq!(header.encode(), [7, 0, 1, 0, 3]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkHeader {
    image_id: ImageId,
    chunk_id: ChunkId,
    chunk_count: ChunkCount,
}

impl ChunkHeader {
    /// Create a new chunk header.
    #[must_use]
    pub const fn new(image_id: ImageId, chunk_id: ChunkId, chunk_count: ChunkCount) -> Self {
        Self {
            image_id,
            chunk_id,
            chunk_count,
        }
    }

    /// Build a header from untyped field values, checking each against its
    /// wire width.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::FieldOverflow`] naming the first field that does
    /// not fit.
    pub fn try_from_raw(image_id: u32, chunk_id: u32, chunk_count: u32) -> Result<Self, HeaderError> {
        let overflow = |field, value, max: u32| HeaderError::FieldOverflow { field, value, max };
        let image = u8::try_from(image_id)
            .map_err(|_| overflow(HeaderField::ImageId, image_id, u8::MAX.into()))?;
        let chunk = u16::try_from(chunk_id)
            .map_err(|_| overflow(HeaderField::ChunkId, chunk_id, u16::MAX.into()))?;
        let count = u16::try_from(chunk_count)
            .map_err(|_| overflow(HeaderField::ChunkCount, chunk_count, u16::MAX.into()))?;
        Ok(Self::new(
            ImageId::new(image),
            ChunkId::new(chunk),
            ChunkCount::new(count),
        ))
    }

    /// Return the image this chunk belongs to.
    #[must_use]
    pub const fn image_id(&self) -> ImageId { self.image_id }

    /// Return the chunk position within its image.
    #[must_use]
    pub const fn chunk_id(&self) -> ChunkId { self.chunk_id }

    /// Return the number of chunks composing the image.
    #[must_use]
    pub const fn chunk_count(&self) -> ChunkCount { self.chunk_count }

    /// Encode the header into its fixed wire representation.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let [id_hi, id_lo] = write_network_u16(self.chunk_id.get());
        let [count_hi, count_lo] = write_network_u16(self.chunk_count.get());
        [self.image_id.get(), id_hi, id_lo, count_hi, count_lo]
    }

    /// Append the encoded header to `dst`.
    pub fn write_to(&self, dst: &mut BytesMut) { dst.put_slice(&self.encode()); }

    /// Decode a header from the front of `bytes`.
    ///
    /// Returns the header together with the offset at which the payload
    /// starts. Any bytes after the header are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::Truncated`] when `bytes` is shorter than
    /// [`HEADER_LEN`].
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), HeaderError> {
        let Some(header) = bytes.get(..HEADER_LEN) else {
            return Err(HeaderError::Truncated {
                len: bytes.len(),
                needed: HEADER_LEN,
            });
        };
        let chunk_id = read_network_u16([header[CHUNK_ID_OFFSET], header[CHUNK_ID_OFFSET + 1]]);
        let chunk_count =
            read_network_u16([header[CHUNK_COUNT_OFFSET], header[CHUNK_COUNT_OFFSET + 1]]);
        Ok((
            Self::new(
                ImageId::new(header[0]),
                ChunkId::new(chunk_id),
                ChunkCount::new(chunk_count),
            ),
            HEADER_LEN,
        ))
    }
}

/// Split a received datagram into its header and payload without copying.
///
/// # Errors
///
/// Returns [`HeaderError::Truncated`] when the datagram cannot hold a header.
pub fn split_datagram(mut datagram: Bytes) -> Result<(ChunkHeader, Bytes), HeaderError> {
    let (header, offset) = ChunkHeader::decode(&datagram)?;
    let payload = datagram.split_off(offset);
    Ok((header, payload))
}
