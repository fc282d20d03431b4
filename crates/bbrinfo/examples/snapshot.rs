//! Print BBR and TCP_INFO telemetry of an outgoing connection.
//!
//! Run with: cargo run -p bbrinfo --example snapshot -- example.com:80

use std::io::Write;
use std::net::TcpStream;

use bbrinfo::{ConnInfo, read_congestion};

fn main() -> bbrinfo::Result<()> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "example.com:80".to_string());

    let mut stream = match TcpStream::connect(&addr) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("connect {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    // Give the congestion controller something to estimate
    let _ = stream.write_all(b"HEAD / HTTP/1.0\r\n\r\n");

    println!("algorithm: {}", read_congestion(&stream)?);

    let snap = ConnInfo::new().snapshot(&stream)?;
    match snap.bbr {
        Some(bbr) => println!(
            "bbr:       bw {} B/s, min_rtt {} us, pacing_gain {:.2}, cwnd_gain {:.2}",
            bbr.bandwidth,
            bbr.min_rtt,
            bbr.pacing_gain_ratio(),
            bbr.cwnd_gain_ratio()
        ),
        None => println!("bbr:       not in use"),
    }
    println!("tcp_info:  {}", snap.tcp.format_ss());

    Ok(())
}
