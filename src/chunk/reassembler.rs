//! Inbound helper that stitches chunks back into complete images.
//!
//! [`Reassembler`] mirrors the outbound [`Fragmenter`](crate::chunk::Fragmenter).
//! It tracks at most one partially received image. A chunk for a newer image
//! discards the partial one (a frame drop); chunks for older images are
//! ignored. Chunks may arrive in any order and may be duplicated, but an image
//! only completes once every one of its slots has been filled.

use bytes::{Bytes, BytesMut};
use log::debug;

use super::{
    ChunkCount,
    ChunkHeader,
    ChunkId,
    ImageId,
    ReassemblyError,
    SupersessionPolicy,
    header::split_datagram,
};
use crate::metrics::{self, Direction};

#[derive(Debug)]
struct InFlightImage {
    image_id: ImageId,
    chunk_count: ChunkCount,
    slots: Vec<Option<Bytes>>,
    received: usize,
}

impl InFlightImage {
    fn new(image_id: ImageId, chunk_count: ChunkCount) -> Self {
        Self {
            image_id,
            chunk_count,
            slots: vec![None; chunk_count.as_usize()],
            received: 0,
        }
    }

    /// Store `payload` in its slot, returning `true` the first time the slot is set.
    fn store(&mut self, chunk_id: ChunkId, payload: Bytes) -> bool {
        let Some(slot) = self.slots.get_mut(chunk_id.as_usize()) else {
            return false;
        };
        let first = slot.is_none();
        *slot = Some(payload);
        if first {
            self.received += 1;
        }
        first
    }

    fn is_complete(&self) -> bool { self.received == self.chunk_count.as_usize() }

    fn into_payload(self) -> Bytes {
        let total = self.slots.iter().flatten().map(Bytes::len).sum();
        let mut buf = BytesMut::with_capacity(total);
        for slot in self.slots.into_iter().flatten() {
            buf.extend_from_slice(&slot);
        }
        buf.freeze()
    }
}

/// Container for a fully reassembled image payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedImage {
    image_id: ImageId,
    payload: Bytes,
}

impl CompletedImage {
    /// Construct a new [`CompletedImage`].
    #[must_use]
    pub fn new(image_id: ImageId, payload: Bytes) -> Self { Self { image_id, payload } }

    /// Identifier shared by the chunks that formed this image.
    #[must_use]
    pub const fn image_id(&self) -> ImageId { self.image_id }

    /// Borrow the reassembled payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Consume the image, returning the owned payload bytes.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }
}

/// Running totals kept by a [`Reassembler`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReassemblyStats {
    /// Images handed out complete.
    pub completed: u64,
    /// Partial images discarded because a newer image started.
    pub frame_drops: u64,
    /// Chunks whose slot had already been filled.
    pub duplicates: u64,
    /// Datagrams too short to carry a header.
    pub truncated: u64,
    /// Chunks whose id lies outside their chunk count.
    pub corrupt: u64,
    /// Chunks whose chunk count disagreed with the tracked image.
    pub count_mismatch: u64,
    /// Chunks belonging to an already superseded image.
    pub stale: u64,
}

/// Stateful single-image reassembler.
///
/// The reassembler is either idle or accumulating one image. It is owned by a
/// single receive loop; callers that share it across tasks must serialise
/// access so that storing a chunk and checking completion stay atomic.
#[derive(Debug, Default)]
pub struct Reassembler {
    policy: SupersessionPolicy,
    in_flight: Option<InFlightImage>,
    stats: ReassemblyStats,
}

impl Reassembler {
    /// Create an idle reassembler ordering image ids with `policy`.
    #[must_use]
    pub fn new(policy: SupersessionPolicy) -> Self {
        Self {
            policy,
            in_flight: None,
            stats: ReassemblyStats::default(),
        }
    }

    /// Return the policy used to decide which image id is newer.
    #[must_use]
    pub const fn policy(&self) -> SupersessionPolicy { self.policy }

    /// Image currently being accumulated, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<ImageId> { self.in_flight.as_ref().map(|image| image.image_id) }

    /// Number of chunks received so far for the in-flight image.
    #[must_use]
    pub fn received_chunks(&self) -> usize { self.in_flight.as_ref().map_or(0, |image| image.received) }

    /// Running totals since construction.
    #[must_use]
    pub const fn stats(&self) -> ReassemblyStats { self.stats }

    /// Drop any partially accumulated image and return to the idle state.
    ///
    /// Returns the id of the discarded image.
    pub fn reset(&mut self) -> Option<ImageId> { self.in_flight.take().map(|image| image.image_id) }

    /// Decode a raw datagram and process the chunk it carries.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::Header`] for datagrams shorter than the
    /// header, or any error raised by [`Reassembler::push`].
    pub fn push_datagram(
        &mut self,
        datagram: Bytes,
    ) -> Result<Option<CompletedImage>, ReassemblyError> {
        metrics::inc_chunks(Direction::Inbound);
        match split_datagram(datagram) {
            Ok((header, payload)) => self.push_counted(header, payload),
            Err(err) => {
                let err = ReassemblyError::from(err);
                self.record_discard(&err);
                Err(err)
            }
        }
    }

    /// Process one chunk.
    ///
    /// Returns `Ok(Some(_))` when the chunk completes its image and `Ok(None)`
    /// while more chunks are required. Errors describe why the chunk was
    /// discarded; the reassembler state is unaffected by a discarded chunk.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::CorruptChunkIndex`] when the chunk id is not
    /// below the chunk count, [`ReassemblyError::ChunkCountMismatch`] when the
    /// count disagrees with the image being accumulated, and
    /// [`ReassemblyError::StaleImage`] when the chunk belongs to an older image.
    pub fn push(
        &mut self,
        header: ChunkHeader,
        payload: impl Into<Bytes>,
    ) -> Result<Option<CompletedImage>, ReassemblyError> {
        metrics::inc_chunks(Direction::Inbound);
        self.push_counted(header, payload.into())
    }

    fn push_counted(
        &mut self,
        header: ChunkHeader,
        payload: Bytes,
    ) -> Result<Option<CompletedImage>, ReassemblyError> {
        let result = self.accept(header, payload);
        if let Err(err) = &result {
            self.record_discard(err);
        }
        result
    }

    fn accept(
        &mut self,
        header: ChunkHeader,
        payload: Bytes,
    ) -> Result<Option<CompletedImage>, ReassemblyError> {
        let image_id = header.image_id();
        if !header.chunk_id().is_within(header.chunk_count()) {
            return Err(ReassemblyError::CorruptChunkIndex {
                image_id,
                chunk_id: header.chunk_id(),
                chunk_count: header.chunk_count(),
            });
        }

        let tracked = self
            .in_flight
            .as_ref()
            .map(|image| (image.image_id, image.chunk_count, image.received));
        match tracked {
            Some((tracked_id, expected, _)) if tracked_id == image_id => {
                if expected != header.chunk_count() {
                    return Err(ReassemblyError::ChunkCountMismatch {
                        image_id,
                        expected,
                        found: header.chunk_count(),
                    });
                }
            }
            Some((tracked_id, _, _)) if !image_id.is_newer_than(tracked_id, self.policy) => {
                return Err(ReassemblyError::StaleImage {
                    image_id,
                    tracked: tracked_id,
                });
            }
            Some((tracked_id, expected, received)) => {
                self.stats.frame_drops += 1;
                metrics::inc_frame_drops();
                debug!(
                    "frame drop: image_id={tracked_id} received={received}/{expected} \
                     superseded_by={image_id}"
                );
                self.in_flight = Some(InFlightImage::new(image_id, header.chunk_count()));
            }
            None => {
                debug!("new image: image_id={image_id} chunk_count={}", header.chunk_count());
                self.in_flight = Some(InFlightImage::new(image_id, header.chunk_count()));
            }
        }

        let Some(image) = self.in_flight.as_mut() else {
            return Ok(None);
        };
        if !image.store(header.chunk_id(), payload) {
            self.stats.duplicates += 1;
        }
        if !image.is_complete() {
            return Ok(None);
        }

        let Some(image) = self.in_flight.take() else {
            return Ok(None);
        };
        self.stats.completed += 1;
        metrics::inc_images_completed();
        Ok(Some(CompletedImage::new(image.image_id, image.into_payload())))
    }

    fn record_discard(&mut self, err: &ReassemblyError) {
        match err {
            ReassemblyError::Header(_) => self.stats.truncated += 1,
            ReassemblyError::CorruptChunkIndex { .. } => self.stats.corrupt += 1,
            ReassemblyError::ChunkCountMismatch { .. } => self.stats.count_mismatch += 1,
            ReassemblyError::StaleImage { .. } => self.stats.stale += 1,
        }
        metrics::inc_discarded(err.reason());
        debug!("chunk discarded: reason={} error={err}", err.reason());
    }
}
