//! Metric helpers for `imagestream`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::chunk::DiscardReason;

/// Name of the counter tracking images handed to the transport.
pub const IMAGES_SENT: &str = "imagestream_images_sent_total";
/// Name of the counter tracking chunks sent or received.
pub const CHUNKS_TOTAL: &str = "imagestream_chunks_total";
/// Name of the counter tracking images reassembled in full.
pub const IMAGES_COMPLETED: &str = "imagestream_images_completed_total";
/// Name of the counter tracking partial images superseded by newer ones.
pub const FRAME_DROPS: &str = "imagestream_frame_drops_total";
/// Name of the counter tracking chunks discarded by the reassembler.
pub const CHUNKS_DISCARDED: &str = "imagestream_chunks_discarded_total";
/// Name of the counter tracking transport and decode failures.
pub const ERRORS_TOTAL: &str = "imagestream_errors_total";

/// Direction of chunk processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Chunks received from the transport.
    Inbound,
    /// Chunks sent to the transport.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "only read by metrics"))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record an image whose chunks were all handed to the transport.
pub fn inc_images_sent() {
    #[cfg(feature = "metrics")]
    counter!(IMAGES_SENT).increment(1);
}

/// Record a chunk processed in the given direction.
pub fn inc_chunks(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(CHUNKS_TOTAL, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a fully reassembled image.
pub fn inc_images_completed() {
    #[cfg(feature = "metrics")]
    counter!(IMAGES_COMPLETED).increment(1);
}

/// Record a partial image discarded in favour of a newer one.
pub fn inc_frame_drops() {
    #[cfg(feature = "metrics")]
    counter!(FRAME_DROPS).increment(1);
}

/// Record a chunk discarded by the reassembler.
pub fn inc_discarded(reason: DiscardReason) {
    #[cfg(feature = "metrics")]
    counter!(CHUNKS_DISCARDED, "reason" => reason.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a transport or decode failure.
pub fn inc_errors() {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL).increment(1);
}
