//! Cyclic image identifiers and the rule deciding which image supersedes another.

use derive_more::{Display, From, Into};

/// Identifier shared by every chunk of one encoded image.
///
/// Identifiers occupy a single byte on the wire and wrap back to zero after
/// `255`.
///
/// # Examples
///
/// ```
/// use imagestream::chunk::ImageId;
/// let id = ImageId::new(255);
/// assert_eq!(id.next(), ImageId::new(0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Display, From, Into)]
#[display("{_0}")]
pub struct ImageId(u8);

impl ImageId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }

    /// Return the identifier following `self`, wrapping after `255`.
    #[must_use]
    pub const fn next(self) -> Self { Self(self.0.wrapping_add(1)) }

    /// Report whether `self` should supersede `tracked` under `policy`.
    ///
    /// Equal identifiers are never newer.
    #[must_use]
    pub fn is_newer_than(self, tracked: Self, policy: SupersessionPolicy) -> bool {
        match policy {
            SupersessionPolicy::Numeric => self.0 > tracked.0,
            SupersessionPolicy::Cyclic => {
                let distance = self.0.wrapping_sub(tracked.0);
                distance != 0 && distance < CYCLIC_HALF_RANGE
            }
        }
    }
}

/// Half of the identifier space; forward distances below it count as newer.
const CYCLIC_HALF_RANGE: u8 = 128;

/// Rule used by the receiver to order image identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SupersessionPolicy {
    /// Plain numeric comparison: an id is newer only if it is larger.
    ///
    /// After the sender wraps from `255` to `0`, chunks for the low ids are
    /// treated as stale for as long as the receiver is still accumulating a
    /// high id. Those images are dropped.
    #[default]
    Numeric,
    /// Serial-number comparison: an id is newer when it lies less than half the
    /// identifier space ahead of the tracked id, modulo 256.
    Cyclic,
}
