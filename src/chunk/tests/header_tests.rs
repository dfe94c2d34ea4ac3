//! Tests for the fixed-width chunk header codec.

use bytes::Bytes;
use rstest::rstest;

use crate::chunk::{
    ChunkCount,
    ChunkHeader,
    ChunkId,
    HEADER_LEN,
    HeaderError,
    HeaderField,
    ImageId,
    split_datagram,
};

#[test]
fn header_is_five_bytes() {
    assert_eq!(HEADER_LEN, 5);
}

#[rstest]
#[case(ChunkHeader::new(ImageId::new(0), ChunkId::zero(), ChunkCount::new(1)), [0, 0, 0, 0, 1])]
#[case(ChunkHeader::new(ImageId::new(7), ChunkId::new(258), ChunkCount::new(513)), [7, 1, 2, 2, 1])]
#[case(ChunkHeader::new(ImageId::new(255), ChunkId::new(u16::MAX), ChunkCount::MAX), [255; 5])]
fn encodes_fields_big_endian_at_fixed_offsets(
    #[case] header: ChunkHeader,
    #[case] expected: [u8; HEADER_LEN],
) {
    assert_eq!(header.encode(), expected);
    let (decoded, offset) = ChunkHeader::decode(&expected).expect("decode header");
    assert_eq!(decoded, header);
    assert_eq!(offset, HEADER_LEN);
}

#[test]
fn decode_ignores_trailing_payload() {
    let datagram = [3_u8, 0, 2, 0, 4, b'x', b'y'];
    let (header, offset) = ChunkHeader::decode(&datagram).expect("decode header");

    assert_eq!(header.image_id(), ImageId::new(3));
    assert_eq!(header.chunk_id(), ChunkId::new(2));
    assert_eq!(header.chunk_count(), ChunkCount::new(4));
    assert_eq!(datagram.get(offset..), Some(&b"xy"[..]));
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(4)]
fn decode_rejects_truncated_headers(#[case] len: usize) {
    let bytes = vec![1_u8; len];
    let err = ChunkHeader::decode(&bytes).expect_err("short header must fail");
    assert_eq!(
        err,
        HeaderError::Truncated {
            len,
            needed: HEADER_LEN
        }
    );
}

#[test]
fn header_only_datagram_has_empty_payload() {
    let (header, payload) =
        split_datagram(Bytes::from_static(&[9, 0, 0, 0, 1])).expect("split datagram");
    assert_eq!(header.image_id(), ImageId::new(9));
    assert!(payload.is_empty());
}

#[rstest]
#[case(256, 0, 1, HeaderField::ImageId, 256, 255)]
#[case(1, 65_536, 1, HeaderField::ChunkId, 65_536, 65_535)]
#[case(1, 0, 70_000, HeaderField::ChunkCount, 70_000, 65_535)]
fn raw_construction_rejects_overflowing_fields(
    #[case] image_id: u32,
    #[case] chunk_id: u32,
    #[case] chunk_count: u32,
    #[case] field: HeaderField,
    #[case] value: u32,
    #[case] max: u32,
) {
    let err = ChunkHeader::try_from_raw(image_id, chunk_id, chunk_count)
        .expect_err("overflowing field must be rejected");
    assert_eq!(err, HeaderError::FieldOverflow { field, value, max });
}

#[test]
fn raw_construction_accepts_maximum_values() {
    let header = ChunkHeader::try_from_raw(255, 65_535, 65_535).expect("max values fit");
    assert_eq!(header.encode(), [255; 5]);
}
