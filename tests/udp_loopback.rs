//! End-to-end streaming over real UDP sockets on the loopback interface.

use std::{io, net::SocketAddr, time::Duration};

use futures::StreamExt;
use imagestream::{
    DatagramSink,
    ImageReceiver,
    ImageSender,
    StreamConfig,
    UdpReceiver,
    UdpSender,
};
use imagestream_testing::patterned;
use tokio::{net::UdpSocket, time::timeout};

const LOOPBACK: &str = "127.0.0.1:0";

fn loopback() -> SocketAddr { LOOPBACK.parse().expect("loopback address") }

#[tokio::test]
async fn images_survive_a_loopback_round_trip() {
    let config = StreamConfig::default();
    let socket = UdpReceiver::bind(loopback(), config.mtu_budget())
        .await
        .expect("bind receiver");
    let peer = socket.local_addr().expect("receiver address");

    let udp = UdpSender::connect(loopback(), peer, config.mtu_budget())
        .await
        .expect("connect sender");
    assert_eq!(udp.peer_addr(), peer);
    let mut sender = ImageSender::new(&config, udp);

    let images = [patterned(3000, 1), patterned(10, 2), patterned(2038, 3)];
    for image in &images {
        sender.send_image(image.clone()).await.expect("send image");
    }

    let mut receiver = ImageReceiver::new(&config);
    let received: Vec<_> = timeout(
        Duration::from_secs(5),
        receiver.images(socket.into_stream()).take(images.len()).collect::<Vec<_>>(),
    )
    .await
    .expect("images arrive in time");

    for (i, (result, expected)) in received.into_iter().zip(&images).enumerate() {
        let image = result.expect("complete image");
        assert_eq!(usize::from(image.image_id().get()), i);
        assert_eq!(image.payload(), expected.as_ref());
    }
    assert_eq!(receiver.stats().completed, 3);
}

#[tokio::test]
async fn datagrams_over_budget_are_refused() {
    let socket = UdpReceiver::bind(loopback(), 64).await.expect("bind receiver");
    let peer = socket.local_addr().expect("receiver address");
    let mut udp = UdpSender::connect(loopback(), peer, 8).await.expect("connect sender");

    let err = udp
        .send_datagram(patterned(9, 0))
        .await
        .expect_err("datagram larger than the budget");
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    udp.send_datagram(patterned(8, 0)).await.expect("datagram within budget");
}

#[tokio::test]
async fn sender_keeps_streaming_while_no_receiver_listens() {
    // Bind and release a port so nothing is listening on it.
    let vacant = UdpSocket::bind(loopback())
        .await
        .expect("reserve port")
        .local_addr()
        .expect("reserved address");

    let config = StreamConfig::default();
    let udp = UdpSender::connect(loopback(), vacant, config.mtu_budget())
        .await
        .expect("bind sender");
    let mut sender = ImageSender::new(&config, udp);

    for seed in 0..3 {
        let image_id = sender
            .send_image(patterned(5000, seed))
            .await
            .expect("unanswered datagrams are not errors");
        assert_eq!(image_id.get(), seed);
    }
}

#[tokio::test]
async fn oversized_datagrams_are_skipped_by_the_receiver() {
    let socket = UdpReceiver::bind(loopback(), 16).await.expect("bind receiver");
    let peer = socket.local_addr().expect("receiver address");
    let raw = UdpSocket::bind(loopback()).await.expect("bind raw sender");

    raw.send_to(&patterned(40, 1), peer).await.expect("send oversized");
    raw.send_to(&patterned(16, 2), peer).await.expect("send fitting");

    let datagram = timeout(Duration::from_secs(5), socket.recv_datagram())
        .await
        .expect("datagram arrives in time")
        .expect("receive datagram");
    assert_eq!(datagram, patterned(16, 2));
}
