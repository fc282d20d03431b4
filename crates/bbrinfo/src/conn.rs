//! Combined per-connection snapshot.
//!
//! A measurement loop usually wants both readings at once: the BBR record
//! when the connection runs BBR, and `TCP_INFO` always. [`ConnInfo`] takes
//! both through one kernel source.

use std::os::fd::AsFd;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bbr::{BbrInfo, BbrReader};
use crate::error::Result;
use crate::sockopt::{Kernel, TcpSockOpt};
use crate::tcp_info::{TcpInfo, TcpInfoReader};

/// Telemetry of one connection at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    /// BBR estimates, if the connection runs BBR and they could be read.
    pub bbr: Option<BbrInfo>,
    /// Generic TCP statistics.
    pub tcp: TcpInfo,
}

/// Reads [`Snapshot`]s of connections.
#[derive(Debug, Clone)]
pub struct ConnInfo<S = Kernel> {
    bbr: BbrReader<S>,
    tcp: TcpInfoReader<S>,
}

impl ConnInfo<Kernel> {
    /// Create a reader backed by the host kernel.
    pub fn new() -> Self {
        Self::with_source(Kernel)
    }
}

impl Default for ConnInfo<Kernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TcpSockOpt + Clone> ConnInfo<S> {
    /// Create a reader backed by `source`.
    pub fn with_source(source: S) -> Self {
        Self {
            bbr: BbrReader::with_source(source.clone()),
            tcp: TcpInfoReader::with_source(source),
        }
    }
}

impl<S: TcpSockOpt> ConnInfo<S> {
    /// Take a snapshot of `fd`.
    ///
    /// Any BBR failure (not BBR, unsupported, OS error) leaves `bbr` empty.
    /// A `TCP_INFO` failure fails the snapshot.
    pub fn snapshot(&self, fd: impl AsFd) -> Result<Snapshot> {
        let fd = fd.as_fd();
        let bbr = match self.bbr.read(fd) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::debug!(error = %e, "no BBR info for snapshot");
                None
            }
        };
        let tcp = self.tcp.read(fd)?;
        Ok(Snapshot { bbr, tcp })
    }
}
