//! Chunk positions and chunk totals within one image.
//!
//! Both values share the two-byte wire width, so an image spans at most
//! `u16::MAX` chunks.

use std::num::TryFromIntError;

use derive_more::{Display, From};

/// Zero-based position of a chunk within its image.
///
/// # Examples
///
/// ```
/// use imagestream::chunk::{ChunkCount, ChunkId};
/// let id = ChunkId::new(2);
/// assert!(id.is_within(ChunkCount::new(3)));
/// assert!(!id.is_within(ChunkCount::new(2)));
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Display, From,
)]
#[display("{_0}")]
pub struct ChunkId(u16);

impl ChunkId {
    /// Construct a chunk id from a `u16` value.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the first chunk id of every image.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Return the id as a slot index.
    #[must_use]
    pub const fn as_usize(self) -> usize { self.0 as usize }

    /// Report whether this id addresses a slot of an image with `count` chunks.
    #[must_use]
    pub const fn is_within(self, count: ChunkCount) -> bool { self.0 < count.get() }
}

impl TryFrom<usize> for ChunkId {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> { u16::try_from(value).map(Self) }
}

impl From<ChunkId> for u16 {
    fn from(value: ChunkId) -> Self { value.0 }
}

/// Total number of chunks composing one image.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Display, From,
)]
#[display("{_0}")]
pub struct ChunkCount(u16);

impl ChunkCount {
    /// Largest number of chunks an image may be split into.
    pub const MAX: Self = Self(u16::MAX);

    /// Construct a chunk count from a `u16` value.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Return the count as a slot total.
    #[must_use]
    pub const fn as_usize(self) -> usize { self.0 as usize }

    /// Whether the count announces an image with no chunks at all.
    #[must_use]
    pub const fn is_zero(self) -> bool { self.0 == 0 }
}

impl TryFrom<usize> for ChunkCount {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> { u16::try_from(value).map(Self) }
}

impl From<ChunkCount> for u16 {
    fn from(value: ChunkCount) -> Self { value.0 }
}
