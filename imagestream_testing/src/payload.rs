//! Deterministic image payloads.

use bytes::Bytes;

/// Build a `len`-byte payload whose bytes depend on `seed` and position.
///
/// Distinct seeds give distinct payloads, so a mixed-up reassembly shows up
/// as a content mismatch rather than passing by coincidence.
#[must_use]
pub fn patterned(len: usize, seed: u8) -> Bytes {
    (0..=u8::MAX)
        .cycle()
        .take(len)
        .map(|low| low.wrapping_mul(31).wrapping_add(seed))
        .collect::<Vec<u8>>()
        .into()
}

/// Build a payload whose first byte is `marker` and is `len` bytes long.
///
/// # Panics
///
/// Panics if `len` is zero.
#[must_use]
pub fn marked(marker: u8, len: usize) -> Bytes {
    assert!(len > 0, "marked payloads need room for the marker");
    let mut bytes = patterned(len, marker.wrapping_add(1)).to_vec();
    bytes[0] = marker;
    bytes.into()
}
