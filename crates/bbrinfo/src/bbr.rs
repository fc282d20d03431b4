//! BBR congestion-control info (`TCP_CC_INFO`).
//!
//! The kernel answers `TCP_CC_INFO` with a `union tcp_cc_info` whose shape is
//! chosen by the algorithm currently active on the socket, and there is no
//! discriminant field. The only signal is how many bytes were written:
//! `tcp_bbr_info` is five 32-bit words, while `tcpvegas_info` and
//! `tcp_dctcp_info` are four, and algorithms without a `get_info` hook
//! (reno, cubic) write nothing. [`decode`] therefore dispatches purely on
//! the reported length.
//!
//! A future non-BBR record that also happens to be 20 bytes long would be
//! misread as BBR. There is no better discriminant in this interface.
//!
//! # Example
//!
//! ```ignore
//! use std::net::TcpStream;
//!
//! let stream = TcpStream::connect("example.com:80")?;
//! match bbrinfo::get_bbr_info(&stream) {
//!     Ok((bandwidth, min_rtt)) => println!("bw={bandwidth} B/s min_rtt={min_rtt} us"),
//!     Err(e) if e.is_not_bbr() => println!("not using BBR"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

use std::os::fd::AsFd;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result};
use crate::sockopt::{Kernel, TcpOption, TcpSockOpt};

/// Size of the kernel's `union tcp_cc_info`: its largest member is
/// `tcp_bbr_info`.
pub const CC_INFO_MAX_LEN: usize = TcpBbrInfo::SIZE;

/// Kernel `struct tcp_bbr_info` (linux/inet_diag.h).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct TcpBbrInfo {
    /// Lower 32 bits of the max-filtered bandwidth estimate (bytes/sec).
    pub bbr_bw_lo: u32,
    /// Upper 32 bits of the bandwidth estimate.
    pub bbr_bw_hi: u32,
    /// Min-filtered RTT (usec).
    pub bbr_min_rtt: u32,
    /// Pacing gain, shifted left 8 bits.
    pub bbr_pacing_gain: u32,
    /// Cwnd gain, shifted left 8 bits.
    pub bbr_cwnd_gain: u32,
}

impl TcpBbrInfo {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Bandwidth estimate assembled from its two halves.
    pub fn bandwidth(&self) -> u64 {
        ((self.bbr_bw_hi as u64) << 32) | self.bbr_bw_lo as u64
    }

    /// Minimum RTT (usec).
    pub fn min_rtt(&self) -> u32 {
        self.bbr_min_rtt
    }
}

/// A `TCP_CC_INFO` record, classified by its reported length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcInfo {
    /// A `tcp_bbr_info` record.
    Bbr(TcpBbrInfo),
    /// Any other record shape, including the empty one.
    Other {
        /// Number of bytes the kernel reported.
        len: usize,
    },
}

/// Classify a raw `TCP_CC_INFO` buffer.
///
/// `len` is the length reported by the kernel, not `raw.len()`. Only a
/// length of exactly [`TcpBbrInfo::SIZE`] is read as BBR; the content of
/// the buffer is never consulted to decide.
pub fn decode(raw: &[u8], len: usize) -> CcInfo {
    if len != TcpBbrInfo::SIZE {
        return CcInfo::Other { len };
    }
    match raw.get(..len).and_then(|b| TcpBbrInfo::read_from_bytes(b).ok()) {
        Some(info) => CcInfo::Bbr(info),
        None => CcInfo::Other { len },
    }
}

/// A decoded BBR reading.
///
/// Units are the kernel's: bytes per second and microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BbrInfo {
    /// Max-filtered bottleneck bandwidth estimate (bytes/sec).
    pub bandwidth: u64,
    /// Min-filtered round-trip time (usec).
    pub min_rtt: u32,
    /// Pacing gain, fixed point with 8 fractional bits.
    pub pacing_gain: u32,
    /// Cwnd gain, fixed point with 8 fractional bits.
    pub cwnd_gain: u32,
}

impl BbrInfo {
    /// Bandwidth widened to floating point.
    pub fn bandwidth_f64(&self) -> f64 {
        self.bandwidth as f64
    }

    /// Minimum RTT widened to floating point.
    pub fn min_rtt_f64(&self) -> f64 {
        self.min_rtt as f64
    }

    /// Pacing gain as a ratio (e.g. 2.885 during startup).
    pub fn pacing_gain_ratio(&self) -> f64 {
        self.pacing_gain as f64 / 256.0
    }

    /// Cwnd gain as a ratio.
    pub fn cwnd_gain_ratio(&self) -> f64 {
        self.cwnd_gain as f64 / 256.0
    }
}

impl From<TcpBbrInfo> for BbrInfo {
    fn from(raw: TcpBbrInfo) -> Self {
        Self {
            bandwidth: raw.bandwidth(),
            min_rtt: raw.min_rtt(),
            pacing_gain: raw.bbr_pacing_gain,
            cwnd_gain: raw.bbr_cwnd_gain,
        }
    }
}

/// Reads BBR info from sockets through a [`TcpSockOpt`] source.
///
/// Whether the source exposes `TCP_CC_INFO` is checked once, at
/// construction; on hosts without it every read fails with
/// [`Error::Unsupported`].
#[derive(Debug, Clone)]
pub struct BbrReader<S = Kernel> {
    source: S,
    supported: bool,
}

impl BbrReader<Kernel> {
    /// Create a reader backed by the host kernel.
    pub fn new() -> Self {
        Self::with_source(Kernel)
    }
}

impl Default for BbrReader<Kernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TcpSockOpt> BbrReader<S> {
    /// Create a reader backed by `source`.
    pub fn with_source(source: S) -> Self {
        let supported = source.supports(TcpOption::CcInfo);
        Self { source, supported }
    }

    /// Whether `TCP_CC_INFO` is available.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Query `TCP_CC_INFO` and classify the record without requiring BBR.
    pub fn read_cc_info(&self, fd: impl AsFd) -> Result<CcInfo> {
        if !self.supported {
            return Err(Error::Unsupported(TcpOption::CcInfo.name()));
        }

        let mut buf = [0u8; CC_INFO_MAX_LEN];
        let len = self.source.get(fd.as_fd(), TcpOption::CcInfo, &mut buf)?;
        Ok(decode(&buf, len))
    }

    /// Read the BBR bandwidth and min-RTT estimates of `fd`.
    ///
    /// Fails with [`Error::NotBbr`] when the socket runs another algorithm.
    pub fn read(&self, fd: impl AsFd) -> Result<BbrInfo> {
        match self.read_cc_info(fd)? {
            CcInfo::Bbr(raw) => Ok(raw.into()),
            CcInfo::Other { len } => {
                tracing::debug!(len, "TCP_CC_INFO record is not tcp_bbr_info");
                Err(Error::NotBbr { len })
            }
        }
    }

    /// Read into caller-provided destinations.
    ///
    /// A missing destination fails with [`Error::InvalidArgument`] before
    /// the kernel is queried. Nothing is written unless both values were
    /// decoded.
    pub fn read_into(
        &self,
        fd: impl AsFd,
        bandwidth: Option<&mut f64>,
        min_rtt: Option<&mut f64>,
    ) -> Result<()> {
        let (bandwidth, min_rtt) = match (bandwidth, min_rtt) {
            (Some(bw), Some(rtt)) => (bw, rtt),
            (None, _) => return Err(Error::InvalidArgument("bandwidth destination is missing")),
            (_, None) => return Err(Error::InvalidArgument("min_rtt destination is missing")),
        };

        let info = self.read(fd)?;
        *bandwidth = info.bandwidth_f64();
        *min_rtt = info.min_rtt_f64();
        Ok(())
    }
}

/// Read the BBR `(bandwidth, min_rtt)` pair of a connected TCP socket.
///
/// Bandwidth is in bytes/sec and min-RTT in microseconds, both widened to
/// `f64` without unit conversion.
pub fn get_bbr_info(fd: impl AsFd) -> Result<(f64, f64)> {
    let info = read_bbr_info(fd)?;
    Ok((info.bandwidth_f64(), info.min_rtt_f64()))
}

/// Read the full BBR record of a connected TCP socket.
pub fn read_bbr_info(fd: impl AsFd) -> Result<BbrInfo> {
    BbrReader::new().read(fd)
}
