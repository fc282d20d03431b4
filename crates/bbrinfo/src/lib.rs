//! Read TCP BBR congestion-control telemetry from live Linux sockets.
//!
//! Given an already-connected TCP socket, this crate queries the kernel's
//! `TCP_CC_INFO` socket option, checks that the returned record really is a
//! `tcp_bbr_info`, and decodes the bottleneck bandwidth and minimum RTT
//! estimates. It also reads `TCP_INFO` and the active algorithm name, which
//! measurement tools usually want next to the BBR record.
//!
//! The crate never creates, configures or closes sockets and never changes
//! the congestion-control algorithm. Every call is a single synchronous,
//! read-only `getsockopt(2)`.
//!
//! # Features
//!
//! - `serde` - `Serialize`/`Deserialize` on [`BbrInfo`], [`TcpInfo`] and [`Snapshot`]
//!
//! # Example
//!
//! ```ignore
//! use std::net::TcpStream;
//!
//! let stream = TcpStream::connect("example.com:80")?;
//!
//! match bbrinfo::read_bbr_info(&stream) {
//!     Ok(info) => println!("bw={} B/s min_rtt={} us", info.bandwidth, info.min_rtt),
//!     Err(e) if e.is_not_bbr() => {
//!         println!("not BBR: {}", bbrinfo::read_congestion(&stream)?);
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! ```
//!
//! # Testing without a kernel
//!
//! All readers are generic over [`TcpSockOpt`], so a test double can stand
//! in for the kernel:
//!
//! ```ignore
//! use bbrinfo::{BbrReader, TcpSockOpt};
//!
//! let reader = BbrReader::with_source(MyFakeKernel::without_cc_info());
//! assert!(reader.read(&stream).unwrap_err().is_unsupported());
//! ```

pub mod bbr;
pub mod congestion;
pub mod conn;
pub mod error;
pub mod sockopt;
pub mod tcp_info;

#[cfg(test)]
mod fixtures;

pub use bbr::{BbrInfo, BbrReader, CC_INFO_MAX_LEN, CcInfo, TcpBbrInfo, decode, get_bbr_info, read_bbr_info};
pub use congestion::{read_congestion, read_congestion_with};
pub use conn::{ConnInfo, Snapshot};
pub use error::{Error, Result};
pub use sockopt::{Kernel, TcpOption, TcpSockOpt};
pub use tcp_info::{TcpInfo, TcpInfoReader, read_tcp_info};
