//! `imagestream` binary: send image files over UDP or receive them.

mod cli;

use std::error::Error;

use clap::Parser;
use cli::{Cli, Command, ReceiveArgs, SendArgs};
use imagestream::{
    ImageReceiver,
    ImageSender,
    Passthrough,
    StreamConfig,
    SupersessionPolicy,
    UdpReceiver,
    UdpSender,
    files::{DirectorySink, FileFrameSource},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Some(addr) = cli.metrics_addr {
        install_metrics(addr)?;
    }

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {err}");
            }
            shutdown.cancel();
        }
    });

    match cli.command {
        Command::Send(args) => send(args, shutdown).await,
        Command::Receive(args) => receive(args, shutdown).await,
    }
}

async fn send(args: SendArgs, shutdown: CancellationToken) -> Result<(), Box<dyn Error>> {
    let config = StreamConfig::new(args.mtu)?;
    let socket = UdpSender::connect(args.bind, args.peer, config.mtu_budget()).await?;
    let mut source = FileFrameSource::new(args.files, args.fps)?;
    let mut sender = ImageSender::new(&config, socket);

    let sent = sender
        .run_with_shutdown(&mut source, &mut Passthrough, shutdown.cancelled())
        .await?;
    info!(sent, "sender finished");
    Ok(())
}

async fn receive(args: ReceiveArgs, shutdown: CancellationToken) -> Result<(), Box<dyn Error>> {
    let policy = if args.cyclic {
        SupersessionPolicy::Cyclic
    } else {
        SupersessionPolicy::Numeric
    };
    let config = StreamConfig::new(args.mtu)?.with_supersession(policy);
    let socket = UdpReceiver::bind(args.bind, config.mtu_budget()).await?;
    let mut sink = DirectorySink::create(args.out_dir, args.extension).await?;
    let mut receiver = ImageReceiver::new(&config);

    let delivered = receiver
        .run_with_shutdown(socket.into_stream(), Passthrough, &mut sink, shutdown.cancelled())
        .await?;
    let stats = receiver.stats();
    info!(
        delivered,
        frame_drops = stats.frame_drops,
        stale = stats.stale,
        "receiver finished"
    );
    Ok(())
}

#[cfg(feature = "metrics")]
fn install_metrics(addr: std::net::SocketAddr) -> Result<(), Box<dyn Error>> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!(%addr, "serving Prometheus metrics");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics(addr: std::net::SocketAddr) -> Result<(), Box<dyn Error>> {
    warn!(%addr, "built without the metrics feature; ignoring --metrics-addr");
    Ok(())
}
