//! Kernel test double and captured records for unit tests.

use std::cell::Cell;
use std::collections::HashMap;
use std::os::fd::BorrowedFd;

use crate::error::{Error, Result};
use crate::sockopt::{TcpOption, TcpSockOpt};

/// What the fake kernel answers for one option.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Copy these bytes out, truncated to the caller's buffer like the kernel does.
    Bytes(Vec<u8>),
    /// Fail with this errno.
    Errno(i32),
}

/// A scripted [`TcpSockOpt`] that counts kernel calls.
#[derive(Debug, Default)]
pub struct FakeSockOpt {
    absent: bool,
    replies: HashMap<TcpOption, Reply>,
    calls: Cell<usize>,
}

impl FakeSockOpt {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that has no TCP-level info facility at all.
    pub fn absent() -> Self {
        Self {
            absent: true,
            ..Self::default()
        }
    }

    pub fn reply(mut self, opt: TcpOption, reply: Reply) -> Self {
        self.replies.insert(opt, reply);
        self
    }

    pub fn bytes(self, opt: TcpOption, bytes: impl Into<Vec<u8>>) -> Self {
        self.reply(opt, Reply::Bytes(bytes.into()))
    }

    pub fn errno(self, opt: TcpOption, errno: i32) -> Self {
        self.reply(opt, Reply::Errno(errno))
    }

    /// Number of `get` calls that reached the fake kernel.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl TcpSockOpt for FakeSockOpt {
    fn supports(&self, _opt: TcpOption) -> bool {
        !self.absent
    }

    fn get(&self, _fd: BorrowedFd<'_>, opt: TcpOption, buf: &mut [u8]) -> Result<usize> {
        self.calls.set(self.calls.get() + 1);
        if self.absent {
            return Err(Error::Unsupported(opt.name()));
        }
        match self.replies.get(&opt) {
            Some(Reply::Bytes(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Reply::Errno(errno)) => Err(Error::from_errno(*errno, opt.name())),
            None => Err(Error::from_errno(libc::ENOPROTOOPT, opt.name())),
        }
    }
}

/// Any open descriptor; the fake never looks at it.
pub fn handle() -> std::io::Stdin {
    std::io::stdin()
}

/// A `tcp_bbr_info` record in host byte order.
pub fn bbr_record(bw_lo: u32, bw_hi: u32, min_rtt: u32, pacing_gain: u32, cwnd_gain: u32) -> Vec<u8> {
    [bw_lo, bw_hi, min_rtt, pacing_gain, cwnd_gain]
        .iter()
        .flat_map(|w| w.to_ne_bytes())
        .collect()
}

/// A `tcpvegas_info` record (also the shape of `tcp_dctcp_info`): four words.
pub fn vegas_record() -> Vec<u8> {
    [1u32, 8, 2_500, 1_800]
        .iter()
        .flat_map(|w| w.to_ne_bytes())
        .collect()
}

/// A `tcp_info` record with the base layout plus the extended fields up to
/// `delivery_rate` (168 bytes).
pub fn tcp_info_record() -> Vec<u8> {
    let mut data = vec![0u8; 168];
    data[0] = 1; // TCP_ESTABLISHED
    data[6] = 0x77; // wscale 7/7
    data[7] = 1; // delivery_rate_app_limited
    put_u32(&mut data, 8, 204_000); // rto
    put_u32(&mut data, 16, 32_768); // snd_mss
    put_u32(&mut data, 68, 1_250); // rtt
    put_u32(&mut data, 72, 500); // rttvar
    put_u32(&mut data, 76, u32::MAX >> 1); // snd_ssthresh
    put_u32(&mut data, 80, 10); // snd_cwnd
    put_u32(&mut data, 100, 3); // total_retrans
    put_u64(&mut data, 104, 2_000_000); // pacing_rate
    put_u64(&mut data, 120, 65_536); // bytes_acked
    put_u32(&mut data, 136, 42); // segs_out
    put_u32(&mut data, 148, 900); // min_rtt
    put_u64(&mut data, 160, 1_000_000); // delivery_rate
    data
}

fn put_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

fn put_u64(data: &mut [u8], offset: usize, value: u64) {
    data[offset..offset + 8].copy_from_slice(&value.to_ne_bytes());
}
