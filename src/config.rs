//! Stream configuration shared by the sender and the receiver.
//!
//! Both ends must agree on the datagram budget; the supersession policy only
//! affects the receiver.

use std::num::NonZeroUsize;

use thiserror::Error;

pub use crate::chunk::SupersessionPolicy;
use crate::chunk::{Fragmenter, HEADER_LEN, Reassembler};

/// UDP port used when none is configured.
pub const DEFAULT_PORT: u16 = 7771;
/// Largest datagram, header included, sent when no budget is configured.
pub const DEFAULT_MTU_BUDGET: usize = 1024;
/// Largest payload a UDP datagram over IPv4 can carry.
pub const MAX_MTU_BUDGET: usize = 65_507;

const DEFAULT_CHUNK_PAYLOAD: NonZeroUsize = match NonZeroUsize::new(DEFAULT_MTU_BUDGET - HEADER_LEN) {
    Some(payload) => payload,
    None => panic!("default MTU budget must exceed the chunk header"),
};

/// Errors raised while validating a [`StreamConfig`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The budget leaves no room for payload after the header.
    #[error("MTU budget {mtu} must exceed the {header}-byte chunk header")]
    MtuTooSmall { mtu: usize, header: usize },
    /// The budget exceeds what a single datagram can carry.
    #[error("MTU budget {mtu} exceeds the datagram limit of {max} bytes")]
    MtuTooLarge { mtu: usize, max: usize },
}

/// Settings that bound datagram sizes and select the receiver's ordering rule.
///
/// # Examples
///
/// ```
/// use imagestream::config::{StreamConfig, SupersessionPolicy};
///
/// let config = StreamConfig::new(1024)
///     .expect("valid budget")
///     .with_supersession(SupersessionPolicy::Cyclic);
/// assert_eq!(config.max_chunk_payload().get(), 1019);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    max_chunk_payload: NonZeroUsize,
    supersession: SupersessionPolicy,
}

impl StreamConfig {
    /// Derive a configuration from the largest datagram the transport guarantees.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MtuTooSmall`] when `mtu_budget` cannot hold a
    /// header plus at least one payload byte, and [`ConfigError::MtuTooLarge`]
    /// when it exceeds [`MAX_MTU_BUDGET`].
    pub fn new(mtu_budget: usize) -> Result<Self, ConfigError> {
        if mtu_budget > MAX_MTU_BUDGET {
            return Err(ConfigError::MtuTooLarge {
                mtu: mtu_budget,
                max: MAX_MTU_BUDGET,
            });
        }
        let max_chunk_payload = NonZeroUsize::new(mtu_budget.saturating_sub(HEADER_LEN)).ok_or(
            ConfigError::MtuTooSmall {
                mtu: mtu_budget,
                header: HEADER_LEN,
            },
        )?;
        Ok(Self {
            max_chunk_payload,
            supersession: SupersessionPolicy::default(),
        })
    }

    /// Replace the receiver's supersession policy.
    #[must_use]
    pub const fn with_supersession(mut self, policy: SupersessionPolicy) -> Self {
        self.supersession = policy;
        self
    }

    /// Largest datagram produced or accepted, header included.
    #[must_use]
    pub const fn mtu_budget(&self) -> usize { self.max_chunk_payload.get() + HEADER_LEN }

    /// Largest payload carried by one chunk.
    #[must_use]
    pub const fn max_chunk_payload(&self) -> NonZeroUsize { self.max_chunk_payload }

    /// Ordering rule applied by the receiver.
    #[must_use]
    pub const fn supersession(&self) -> SupersessionPolicy { self.supersession }

    /// Build a fragmenter honouring this configuration.
    #[must_use]
    pub const fn fragmenter(&self) -> Fragmenter { Fragmenter::new(self.max_chunk_payload) }

    /// Build an idle reassembler honouring this configuration.
    #[must_use]
    pub fn reassembler(&self) -> Reassembler { Reassembler::new(self.supersession) }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_chunk_payload: DEFAULT_CHUNK_PAYLOAD,
            supersession: SupersessionPolicy::default(),
        }
    }
}
