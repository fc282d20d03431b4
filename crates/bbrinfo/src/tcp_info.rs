//! Generic TCP statistics (`TCP_INFO`).
//!
//! Every congestion-control algorithm fills `struct tcp_info`, so this is
//! the baseline sampled next to the BBR record. The structure has grown
//! over kernel releases; fields past the 104-byte base layout are decoded
//! only when the kernel wrote them and are zero otherwise.

use std::os::fd::AsFd;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sockopt::{Kernel, TcpOption, TcpSockOpt};

/// Length of the original (2.6-era) `struct tcp_info`.
pub const TCP_INFO_BASE_LEN: usize = 104;

/// Buffer used for the query; larger than any current `struct tcp_info`.
const TCP_INFO_BUF_LEN: usize = 256;

/// TCP information structure (from tcp_info).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TcpInfo {
    /// State.
    pub state: u8,
    /// CA state.
    pub ca_state: u8,
    /// Retransmits.
    pub retransmits: u8,
    /// Probes.
    pub probes: u8,
    /// Backoff.
    pub backoff: u8,
    /// Options.
    pub options: u8,
    /// Send/receive window scale.
    pub wscale: u8,
    /// Delivery rate app limited flag.
    pub delivery_rate_app_limited: bool,

    /// Retransmit timeout (usec).
    pub rto: u32,
    /// Delayed ACK timeout (usec).
    pub ato: u32,
    /// Send MSS.
    pub snd_mss: u32,
    /// Receive MSS.
    pub rcv_mss: u32,

    /// Unacked packets.
    pub unacked: u32,
    /// Sacked packets.
    pub sacked: u32,
    /// Lost packets.
    pub lost: u32,
    /// Retransmitted packets.
    pub retrans: u32,
    /// Forward acknowledged packets.
    pub fackets: u32,

    /// Last data sent timestamp.
    pub last_data_sent: u32,
    /// Last ACK sent timestamp.
    pub last_ack_sent: u32,
    /// Last data received timestamp.
    pub last_data_recv: u32,
    /// Last ACK received timestamp.
    pub last_ack_recv: u32,

    /// Path MTU.
    pub pmtu: u32,
    /// Receive SSTHRESH.
    pub rcv_ssthresh: u32,
    /// Smoothed RTT (usec).
    pub rtt: u32,
    /// RTT variance (usec).
    pub rttvar: u32,
    /// Send SSTHRESH.
    pub snd_ssthresh: u32,
    /// Send CWND.
    pub snd_cwnd: u32,
    /// Advertised MSS.
    pub advmss: u32,
    /// Reordering.
    pub reordering: u32,

    /// Receive RTT (usec).
    pub rcv_rtt: u32,
    /// Receive space.
    pub rcv_space: u32,

    /// Total retransmits.
    pub total_retrans: u32,

    /// Pacing rate (bytes/sec).
    pub pacing_rate: u64,
    /// Max pacing rate (bytes/sec).
    pub max_pacing_rate: u64,
    /// Bytes ACKed.
    pub bytes_acked: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Segments out.
    pub segs_out: u32,
    /// Segments in.
    pub segs_in: u32,

    /// Not sent bytes.
    pub notsent_bytes: u32,
    /// Minimum RTT (usec).
    pub min_rtt: u32,
    /// Data segments in.
    pub data_segs_in: u32,
    /// Data segments out.
    pub data_segs_out: u32,

    /// Delivery rate (bytes/sec).
    pub delivery_rate: u64,

    /// Busy time (usec).
    pub busy_time: u64,
    /// RWnd limited time (usec).
    pub rwnd_limited: u64,
    /// Sndbuf limited time (usec).
    pub sndbuf_limited: u64,

    /// Delivered packets.
    pub delivered: u32,
    /// Delivered with CE mark.
    pub delivered_ce: u32,

    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes retransmitted.
    pub bytes_retrans: u64,
    /// Duplicate SACKs received.
    pub dsack_dups: u32,
    /// Reordering seen.
    pub reord_seen: u32,

    /// Receive out-of-order rate.
    pub rcv_ooopack: u32,
    /// Send window.
    pub snd_wnd: u32,
}

/// Native-endian field reader over a `tcp_info` buffer.
struct Fields<'a>(&'a [u8]);

impl Fields<'_> {
    fn has(&self, end: usize) -> bool {
        self.0.len() >= end
    }

    fn u32(&self, offset: usize) -> u32 {
        self.0
            .get(offset..offset + 4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_ne_bytes)
            .unwrap_or(0)
    }

    fn u64(&self, offset: usize) -> u64 {
        self.0
            .get(offset..offset + 8)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_ne_bytes)
            .unwrap_or(0)
    }
}

impl TcpInfo {
    /// Decode a `struct tcp_info` as written by the kernel.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < TCP_INFO_BASE_LEN {
            return Err(Error::Truncated {
                expected: TCP_INFO_BASE_LEN,
                actual: data.len(),
            });
        }

        let f = Fields(data);
        let mut info = TcpInfo {
            state: data[0],
            ca_state: data[1],
            retransmits: data[2],
            probes: data[3],
            backoff: data[4],
            options: data[5],
            wscale: data[6],
            delivery_rate_app_limited: data[7] & 0x01 != 0,

            rto: f.u32(8),
            ato: f.u32(12),
            snd_mss: f.u32(16),
            rcv_mss: f.u32(20),

            unacked: f.u32(24),
            sacked: f.u32(28),
            lost: f.u32(32),
            retrans: f.u32(36),
            fackets: f.u32(40),

            last_data_sent: f.u32(44),
            last_ack_sent: f.u32(48),
            last_data_recv: f.u32(52),
            last_ack_recv: f.u32(56),

            pmtu: f.u32(60),
            rcv_ssthresh: f.u32(64),
            rtt: f.u32(68),
            rttvar: f.u32(72),
            snd_ssthresh: f.u32(76),
            snd_cwnd: f.u32(80),
            advmss: f.u32(84),
            reordering: f.u32(88),

            rcv_rtt: f.u32(92),
            rcv_space: f.u32(96),

            total_retrans: f.u32(100),
            ..Default::default()
        };

        // Extended fields, oldest first
        if f.has(160) {
            info.pacing_rate = f.u64(104);
            info.max_pacing_rate = f.u64(112);
            info.bytes_acked = f.u64(120);
            info.bytes_received = f.u64(128);
            info.segs_out = f.u32(136);
            info.segs_in = f.u32(140);
            info.notsent_bytes = f.u32(144);
            info.min_rtt = f.u32(148);
            info.data_segs_in = f.u32(152);
            info.data_segs_out = f.u32(156);
        }
        if f.has(168) {
            info.delivery_rate = f.u64(160);
        }
        if f.has(192) {
            info.busy_time = f.u64(168);
            info.rwnd_limited = f.u64(176);
            info.sndbuf_limited = f.u64(184);
        }
        if f.has(200) {
            info.delivered = f.u32(192);
            info.delivered_ce = f.u32(196);
        }
        if f.has(224) {
            info.bytes_sent = f.u64(200);
            info.bytes_retrans = f.u64(208);
            info.dsack_dups = f.u32(216);
            info.reord_seen = f.u32(220);
        }
        if f.has(232) {
            info.rcv_ooopack = f.u32(224);
            info.snd_wnd = f.u32(228);
        }

        Ok(info)
    }

    /// Smoothed RTT in milliseconds.
    pub fn smoothed_rtt_ms(&self) -> f64 {
        self.rtt as f64 / 1000.0
    }

    /// RTT variance in milliseconds.
    pub fn rtt_var_ms(&self) -> f64 {
        self.rttvar as f64 / 1000.0
    }

    /// Format as ss-style string with the non-zero metrics.
    ///
    /// ```text
    /// rtt:1.250/0.500 mss:32768 cwnd:10 bytes_acked:65536 minrtt:0.900
    /// ```
    pub fn format_ss(&self) -> String {
        let mut parts = Vec::new();

        if self.rtt > 0 {
            parts.push(format!(
                "rtt:{:.3}/{:.3}",
                self.smoothed_rtt_ms(),
                self.rtt_var_ms()
            ));
        }
        if self.snd_mss > 0 {
            parts.push(format!("mss:{}", self.snd_mss));
        }
        if self.snd_cwnd > 0 {
            parts.push(format!("cwnd:{}", self.snd_cwnd));
        }
        // "infinite" ssthresh is not worth printing
        if self.snd_ssthresh > 0 && self.snd_ssthresh < 0x7fff_ffff {
            parts.push(format!("ssthresh:{}", self.snd_ssthresh));
        }
        if self.bytes_acked > 0 {
            parts.push(format!("bytes_acked:{}", self.bytes_acked));
        }
        if self.bytes_received > 0 {
            parts.push(format!("bytes_received:{}", self.bytes_received));
        }
        if self.segs_out > 0 {
            parts.push(format!("segs_out:{}", self.segs_out));
        }
        if self.segs_in > 0 {
            parts.push(format!("segs_in:{}", self.segs_in));
        }
        if self.retrans > 0 || self.total_retrans > 0 {
            parts.push(format!("retrans:{}/{}", self.retrans, self.total_retrans));
        }
        if self.delivery_rate > 0 {
            parts.push(format!(
                "delivery_rate:{}{}",
                format_rate_bps(self.delivery_rate.saturating_mul(8)),
                if self.delivery_rate_app_limited {
                    "app_limited"
                } else {
                    ""
                }
            ));
        }
        if self.pacing_rate > 0 && self.pacing_rate < u64::MAX {
            parts.push(format!(
                "pacing_rate:{}",
                format_rate_bps(self.pacing_rate.saturating_mul(8))
            ));
        }
        if self.min_rtt > 0 {
            parts.push(format!("minrtt:{:.3}", self.min_rtt as f64 / 1000.0));
        }

        parts.join(" ")
    }

    /// Get the send window scale (high nibble of wscale).
    pub fn snd_wscale(&self) -> u8 {
        self.wscale >> 4
    }

    /// Get the receive window scale (low nibble of wscale).
    pub fn rcv_wscale(&self) -> u8 {
        self.wscale & 0x0f
    }
}

/// Format bits per second as human-readable string.
pub fn format_rate_bps(bps: u64) -> String {
    if bps >= 1_000_000_000 {
        format!("{:.1}Gbps", bps as f64 / 1_000_000_000.0)
    } else if bps >= 1_000_000 {
        format!("{:.1}Mbps", bps as f64 / 1_000_000.0)
    } else if bps >= 1_000 {
        format!("{:.1}Kbps", bps as f64 / 1_000.0)
    } else {
        format!("{}bps", bps)
    }
}

/// Reads `TCP_INFO` through a [`TcpSockOpt`] source.
#[derive(Debug, Clone)]
pub struct TcpInfoReader<S = Kernel> {
    source: S,
    supported: bool,
}

impl TcpInfoReader<Kernel> {
    /// Create a reader backed by the host kernel.
    pub fn new() -> Self {
        Self::with_source(Kernel)
    }
}

impl Default for TcpInfoReader<Kernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TcpSockOpt> TcpInfoReader<S> {
    /// Create a reader backed by `source`.
    pub fn with_source(source: S) -> Self {
        let supported = source.supports(TcpOption::Info);
        Self { source, supported }
    }

    /// Read and decode `TCP_INFO` of `fd`.
    pub fn read(&self, fd: impl AsFd) -> Result<TcpInfo> {
        if !self.supported {
            return Err(Error::Unsupported(TcpOption::Info.name()));
        }

        let mut buf = [0u8; TCP_INFO_BUF_LEN];
        let len = self.source.get(fd.as_fd(), TcpOption::Info, &mut buf)?;
        TcpInfo::parse(&buf[..len.min(buf.len())])
    }
}

/// Read `TCP_INFO` of a TCP socket.
pub fn read_tcp_info(fd: impl AsFd) -> Result<TcpInfo> {
    TcpInfoReader::new().read(fd)
}
