//! Sender and receiver loops driven by scripted collaborators.

use std::{future, io};

use bytes::Bytes;
use imagestream::{
    ImageReceiver,
    ImageSender,
    Passthrough,
    ReceiveError,
    SendError,
    StreamConfig,
};
use imagestream_testing::{
    MemoryLink,
    RecordingSink,
    RejectingDecoder,
    ScriptedSource,
    Traffic,
    marked,
    patterned,
};
use rstest::{fixture, rstest};

#[fixture]
fn config() -> StreamConfig { StreamConfig::new(16).expect("valid budget") }

async fn capture(config: &StreamConfig, images: &[Bytes]) -> Traffic {
    let mut sender = ImageSender::new(config, MemoryLink::new());
    for image in images {
        sender.send_image(image.clone()).await.expect("send image");
    }
    sender.into_sink().into_traffic()
}

#[rstest]
#[tokio::test]
async fn sender_streams_until_shutdown(config: StreamConfig) {
    let frames = [patterned(20, 1), patterned(5, 2), patterned(33, 3)];
    let (mut source, exhausted) = ScriptedSource::new(frames);
    let mut sender = ImageSender::new(&config, MemoryLink::new());

    let sent = sender
        .run_with_shutdown(&mut source, &mut Passthrough, async {
            let _ = exhausted.await;
        })
        .await
        .expect("sender loop");

    assert_eq!(sent, 3);
    assert_eq!(sender.next_image_id().get(), 3);
    assert_eq!(sender.sink().datagrams().len(), 2 + 1 + 3);
}

#[rstest]
#[tokio::test]
async fn sender_reports_transport_failure_without_retrying(config: StreamConfig) {
    let mut sender = ImageSender::new(&config, MemoryLink::failing_after(2));

    let err = sender
        .send_image(patterned(40, 0))
        .await
        .expect_err("link fails on the third chunk");

    match err {
        SendError::Transport {
            image_id,
            chunk_id,
            source,
        } => {
            assert_eq!(image_id.get(), 0);
            assert_eq!(chunk_id.get(), 2);
            assert_eq!(source.kind(), io::ErrorKind::ConnectionRefused);
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    assert_eq!(sender.sink().datagrams().len(), 2);
    assert_eq!(sender.next_image_id().get(), 1);
}

#[rstest]
#[tokio::test]
async fn receiver_delivers_images_and_reports_decode_failures(config: StreamConfig) {
    let bad = marked(0xee, 15);
    let traffic = capture(&config, &[patterned(20, 1), bad, patterned(8, 3)]).await;
    let mut receiver = ImageReceiver::new(&config);
    let mut sink = RecordingSink::new();

    let delivered = receiver
        .run_with_shutdown(
            traffic.into_stream(),
            RejectingDecoder { marker: 0xee },
            &mut sink,
            future::pending(),
        )
        .await
        .expect("receiver loop");

    assert_eq!(delivered, 2);
    assert_eq!(sink.ids(), [0, 2]);
    assert_eq!(sink.decode_failures.len(), 1);
    assert_eq!(sink.decode_failures[0].get(), 1);
}

#[rstest]
#[tokio::test]
async fn receiver_stops_when_the_sink_fails(config: StreamConfig) {
    let traffic = capture(&config, &[patterned(4, 1), patterned(4, 2)]).await;
    let mut receiver = ImageReceiver::new(&config);
    let mut sink = RecordingSink::with_capacity(1);

    let err = receiver
        .run_with_shutdown(traffic.into_stream(), Passthrough, &mut sink, future::pending())
        .await
        .expect_err("sink rejects the second image");

    assert!(matches!(err, ReceiveError::Sink(_)));
    assert!(err.is_fatal());
    assert_eq!(sink.ids(), [0]);
}

#[rstest]
#[tokio::test]
async fn receiver_surfaces_transport_errors(config: StreamConfig) {
    let traffic = capture(&config, &[patterned(4, 1)]).await;
    let mut receiver = ImageReceiver::new(&config);
    let mut sink = RecordingSink::new();

    let err = receiver
        .run_with_shutdown(
            traffic.into_stream_then_error(io::ErrorKind::BrokenPipe),
            Passthrough,
            &mut sink,
            future::pending(),
        )
        .await
        .expect_err("transport failure ends the loop");

    assert!(matches!(err, ReceiveError::Transport(_)));
    assert_eq!(sink.ids(), [0]);
}

#[rstest]
#[tokio::test]
async fn receiver_honours_shutdown(config: StreamConfig) {
    let mut receiver = ImageReceiver::new(&config);
    let mut sink = RecordingSink::new();

    let delivered = receiver
        .run_with_shutdown(
            futures::stream::pending::<io::Result<Bytes>>(),
            Passthrough,
            &mut sink,
            future::ready(()),
        )
        .await
        .expect("shutdown is not an error");

    assert_eq!(delivered, 0);
}
