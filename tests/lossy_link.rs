//! Reassembly behaviour under loss, reordering, and duplication.
//!
//! Traffic is captured from a real sender on an in-memory link, mangled, and
//! replayed into a receiver.

use std::io;

use bytes::Bytes;
use futures::StreamExt;
use imagestream::{
    CompletedImage,
    ImageReceiver,
    ImageSender,
    ReceiveError,
    StreamConfig,
    SupersessionPolicy,
    chunk::Fragmenter,
};
use imagestream_testing::{MemoryLink, Traffic, patterned};
use rstest::{fixture, rstest};

/// 16-byte datagrams carry 11 payload bytes per chunk.
#[fixture]
fn config() -> StreamConfig { StreamConfig::new(16).expect("valid budget") }

async fn capture(config: &StreamConfig, images: &[Bytes]) -> Traffic {
    let mut sender = ImageSender::new(config, MemoryLink::new());
    for image in images {
        sender.send_image(image.clone()).await.expect("send image");
    }
    sender.into_sink().into_traffic()
}

async fn replay(receiver: &mut ImageReceiver, traffic: Traffic) -> Vec<CompletedImage> {
    receiver
        .images(traffic.into_stream())
        .map(|item| item.expect("no transport errors"))
        .collect()
        .await
}

#[rstest]
#[tokio::test]
async fn reordered_chunks_still_complete(config: StreamConfig) {
    let image = patterned(50, 7);
    let traffic = capture(&config, std::slice::from_ref(&image)).await;
    assert_eq!(traffic.len(), 5);

    let mut receiver = ImageReceiver::new(&config);
    let images = replay(&mut receiver, traffic.reordered(&[3, 0, 4, 2, 1])).await;

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].payload(), image.as_ref());
}

#[rstest]
#[tokio::test]
async fn lost_chunk_drops_the_frame_and_the_next_image_arrives(config: StreamConfig) {
    let first = patterned(30, 1);
    let second = patterned(30, 2);
    let traffic = capture(&config, &[first, second.clone()]).await;

    let mut receiver = ImageReceiver::new(&config);
    let images = replay(&mut receiver, traffic.dropping(&[1])).await;

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].image_id().get(), 1);
    assert_eq!(images[0].payload(), second.as_ref());
    assert_eq!(receiver.stats().frame_drops, 1);
}

#[rstest]
#[tokio::test]
async fn duplicated_chunk_is_delivered_once(config: StreamConfig) {
    let image = patterned(30, 9);
    let traffic = capture(&config, std::slice::from_ref(&image)).await;

    let mut receiver = ImageReceiver::new(&config);
    let images = replay(&mut receiver, traffic.duplicating(0)).await;

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].payload(), image.as_ref());
    assert_eq!(receiver.stats().duplicates, 1);
}

#[rstest]
#[tokio::test]
async fn late_chunks_of_a_superseded_image_are_ignored(config: StreamConfig) {
    // Two chunks per image: [0.0, 0.1, 1.0, 1.1]. Deliver 0.0, 1.0, 0.1, 1.1.
    let second = patterned(20, 2);
    let traffic = capture(&config, &[patterned(20, 1), second.clone()]).await;

    let mut receiver = ImageReceiver::new(&config);
    let images = replay(&mut receiver, traffic.reordered(&[0, 2, 1, 3])).await;

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].payload(), second.as_ref());
    let stats = receiver.stats();
    assert_eq!(stats.frame_drops, 1);
    assert_eq!(stats.stale, 1);
}

#[rstest]
#[tokio::test]
async fn older_image_after_completion_is_accepted(config: StreamConfig) {
    let traffic = capture(&config, &[patterned(20, 1), patterned(20, 2)]).await;

    let mut receiver = ImageReceiver::new(&config);
    let images = replay(&mut receiver, traffic.reordered(&[2, 3, 0, 1])).await;

    let ids: Vec<u8> = images.iter().map(|image| image.image_id().get()).collect();
    assert_eq!(ids, [1, 0]);
}

#[rstest]
#[tokio::test]
async fn malformed_datagrams_are_skipped(config: StreamConfig) {
    let image = patterned(20, 4);
    let traffic = capture(&config, std::slice::from_ref(&image)).await;
    let noise = Traffic(vec![
        Bytes::from_static(&[0, 1]),
        // Chunk id 3 of a two-chunk image.
        Bytes::from_static(&[0, 0, 3, 0, 2, 0xff]),
    ]);

    let mut receiver = ImageReceiver::new(&config);
    let images = replay(&mut receiver, noise.then(traffic)).await;

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].payload(), image.as_ref());
    let stats = receiver.stats();
    assert_eq!(stats.truncated, 1);
    assert_eq!(stats.corrupt, 1);
}

#[rstest]
#[case(SupersessionPolicy::Numeric, 0)]
#[case(SupersessionPolicy::Cyclic, 1)]
#[tokio::test]
async fn id_wraparound_depends_on_policy(
    config: StreamConfig,
    #[case] policy: SupersessionPolicy,
    #[case] expected: usize,
) {
    // Image 255 loses its last chunk, then image 0 arrives in full.
    let fragmenter =
        Fragmenter::with_starting_id(config.max_chunk_payload(), imagestream::ImageId::new(255));
    let mut sender = ImageSender::with_fragmenter(fragmenter, MemoryLink::new());
    sender.send_image(patterned(20, 1)).await.expect("send 255");
    sender.send_image(patterned(20, 2)).await.expect("send 0");
    let traffic = sender.into_sink().into_traffic().dropping(&[1]);

    let mut receiver = ImageReceiver::new(&config.with_supersession(policy));
    let images = replay(&mut receiver, traffic).await;

    assert_eq!(images.len(), expected);
}

#[rstest]
#[tokio::test]
async fn transport_error_ends_the_stream(config: StreamConfig) {
    let traffic = capture(&config, &[patterned(20, 1)]).await;
    let mut receiver = ImageReceiver::new(&config);

    let items: Vec<_> = receiver
        .images(traffic.into_stream_then_error(io::ErrorKind::ConnectionReset))
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    let err = items[1].as_ref().expect_err("transport failure is reported");
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        ReceiveError::Transport(source) if source.kind() == io::ErrorKind::ConnectionReset
    ));
}
