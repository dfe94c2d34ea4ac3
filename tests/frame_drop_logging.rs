//! Log output emitted by the reassembler.

use imagestream::{ChunkHeader, Reassembler, SupersessionPolicy};
use imagestream_testing::{LoggerHandle, logger};
use log::Level;
use rstest::rstest;

fn header(image_id: u32, chunk_id: u32, chunk_count: u32) -> ChunkHeader {
    ChunkHeader::try_from_raw(image_id, chunk_id, chunk_count).expect("valid header")
}

#[rstest]
fn frame_drop_is_logged_at_debug(mut logger: LoggerHandle) {
    let mut reassembler = Reassembler::new(SupersessionPolicy::Numeric);
    reassembler
        .push(header(4, 0, 3), &b"abc"[..])
        .expect("first chunk");
    reassembler
        .push(header(5, 0, 2), &b"def"[..])
        .expect("newer image");

    let debug = logger.drain_level(Level::Debug);
    assert!(
        debug
            .iter()
            .any(|msg| msg.contains("frame drop") && msg.contains("image_id=4")),
        "frame drop not logged: {debug:?}"
    );
}

#[rstest]
fn discarded_chunk_is_logged_with_reason(mut logger: LoggerHandle) {
    let mut reassembler = Reassembler::new(SupersessionPolicy::Numeric);
    let _ = reassembler.push(header(1, 5, 2), &b"x"[..]);

    let debug = logger.drain_level(Level::Debug);
    assert!(
        debug.iter().any(|msg| msg.contains("reason=corrupt_chunk_index")),
        "discard not logged: {debug:?}"
    );
}
