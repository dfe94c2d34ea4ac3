//! Command line interface for the `imagestream` binary.
//!
//! Kept free of crate types so the build script can include it to render the
//! manual page.

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf};

use clap::{Args, Parser, Subcommand};

/// Command line arguments for the `imagestream` binary.
#[derive(Debug, Parser)]
#[command(
    name = "imagestream",
    version,
    about = "Stream encoded images over UDP without retransmission"
)]
pub struct Cli {
    /// Serve Prometheus metrics on this address.
    #[arg(long, global = true, value_name = "ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Command,
}

/// Role played by this process.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay image files to a receiver at a fixed frame rate.
    Send(SendArgs),
    /// Reassemble images from the network and write them to a directory.
    Receive(ReceiveArgs),
}

/// Options for the `send` subcommand.
#[derive(Debug, Args)]
pub struct SendArgs {
    /// Receiver address.
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:7771")]
    pub peer: SocketAddr,

    /// Local address to send from.
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0:0")]
    pub bind: SocketAddr,

    /// Largest datagram to send, header included.
    #[arg(long, value_name = "BYTES", default_value_t = 1024)]
    pub mtu: usize,

    /// Frames sent per second.
    #[arg(long, default_value = "30")]
    pub fps: NonZeroU32,

    /// Pre-encoded image files, replayed in order and then repeated.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Options for the `receive` subcommand.
#[derive(Debug, Args)]
pub struct ReceiveArgs {
    /// Address to listen on.
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0:7771")]
    pub bind: SocketAddr,

    /// Largest datagram to accept, header included.
    #[arg(long, value_name = "BYTES", default_value_t = 1024)]
    pub mtu: usize,

    /// Directory receiving reassembled images.
    #[arg(long, value_name = "DIR", default_value = "received")]
    pub out_dir: PathBuf,

    /// File extension for stored images.
    #[arg(long, default_value = "jpg")]
    pub extension: String,

    /// Treat image ids as a cycle so streams survive the 255 to 0 wrap.
    #[arg(long)]
    pub cyclic: bool,
}
