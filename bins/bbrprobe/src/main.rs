//! bbrprobe command - sample BBR and TCP_INFO telemetry of a connection.
//!
//! Connects to an endpoint, optionally pushes traffic through the
//! connection, and prints the kernel's congestion-control readings one or
//! more times.

mod output;

use std::time::Duration;

use bbrinfo::{ConnInfo, read_congestion};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "bbrprobe", version, about = "Sample TCP BBR telemetry of a connection")]
struct Cli {
    /// Endpoint to connect to (host:port).
    addr: String,

    /// Bytes to send before the first sample.
    #[arg(short = 'b', long, default_value_t = 0)]
    bytes: u64,

    /// Number of samples to take.
    #[arg(short = 'c', long, default_value_t = 1)]
    count: u32,

    /// Delay between samples in milliseconds.
    #[arg(short = 'i', long, default_value_t = 1000)]
    interval_ms: u64,

    /// Output in JSON format (one object per line).
    #[arg(short = 'j', long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut stream = TcpStream::connect(&cli.addr).await?;
    tracing::info!(peer = %stream.peer_addr()?, "connected");

    if cli.bytes > 0 {
        push(&mut stream, cli.bytes).await?;
    }

    let algorithm = read_congestion(&stream)?;
    let info = ConnInfo::new();

    for seq in 0..cli.count {
        if seq > 0 {
            tokio::time::sleep(Duration::from_millis(cli.interval_ms)).await;
        }
        let snapshot = info.snapshot(&stream)?;
        let sample = output::Sample {
            seq,
            algorithm: &algorithm,
            snapshot: &snapshot,
        };
        if cli.json {
            output::print_json(&sample)?;
        } else {
            output::print_text(&sample);
        }
    }

    Ok(())
}

/// Write `total` bytes of filler to the peer.
async fn push(stream: &mut TcpStream, total: u64) -> anyhow::Result<()> {
    let chunk = vec![0u8; 64 * 1024];
    let mut sent = 0u64;
    while sent < total {
        let n = chunk.len().min((total - sent) as usize);
        stream.write_all(&chunk[..n]).await?;
        sent += n as u64;
    }
    stream.flush().await?;
    tracing::debug!(sent, "traffic pushed");
    Ok(())
}
