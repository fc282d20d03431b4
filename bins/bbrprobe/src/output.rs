//! Sample formatting.

use std::io;

use bbrinfo::Snapshot;
use bbrinfo::tcp_info::format_rate_bps;
use serde::Serialize;

/// One printed sample.
#[derive(Serialize)]
pub struct Sample<'a> {
    pub seq: u32,
    pub algorithm: &'a str,
    #[serde(flatten)]
    pub snapshot: &'a Snapshot,
}

/// Print a sample as one line of JSON.
pub fn print_json(sample: &Sample<'_>) -> io::Result<()> {
    let line = serde_json::to_string(sample)?;
    println!("{}", line);
    Ok(())
}

/// Print a sample as text.
pub fn print_text(sample: &Sample<'_>) {
    let bbr = match &sample.snapshot.bbr {
        Some(bbr) => format!(
            "bw:{} minrtt:{:.3} pacing_gain:{:.2} cwnd_gain:{:.2}",
            format_rate(bbr.bandwidth),
            bbr.min_rtt as f64 / 1000.0,
            bbr.pacing_gain_ratio(),
            bbr.cwnd_gain_ratio()
        ),
        None => "bbr:-".to_string(),
    };
    println!(
        "#{} {} {} | {}",
        sample.seq,
        sample.algorithm,
        bbr,
        sample.snapshot.tcp.format_ss()
    );
}

/// Format a bytes-per-second estimate as bits per second.
fn format_rate(bytes_per_sec: u64) -> String {
    format_rate_bps(bytes_per_sec.saturating_mul(8))
}
