//! TCP-level socket option access.
//!
//! [`TcpSockOpt`] is the only place where this crate touches the kernel.
//! Everything above it (record decoding, size checks, snapshots) works on
//! plain byte buffers, so readers can be driven by a test double that
//! simulates a host without the facility, arbitrary record sizes or OS
//! failures.

use std::os::fd::BorrowedFd;

use crate::error::{Error, Result};

// TCP socket options (from linux/tcp.h)
const TCP_INFO: libc::c_int = 11;
const TCP_CONGESTION: libc::c_int = 13;
const TCP_CC_INFO: libc::c_int = 26;

/// TCP-level options this crate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcpOption {
    /// `TCP_INFO`: the generic `struct tcp_info` counters.
    Info,
    /// `TCP_CONGESTION`: name of the active congestion-control algorithm.
    Congestion,
    /// `TCP_CC_INFO`: the algorithm-specific `union tcp_cc_info`.
    CcInfo,
}

impl TcpOption {
    /// Get the option number passed to `getsockopt`.
    pub fn raw(&self) -> libc::c_int {
        match self {
            Self::Info => TCP_INFO,
            Self::Congestion => TCP_CONGESTION,
            Self::CcInfo => TCP_CC_INFO,
        }
    }

    /// Get the option name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Info => "TCP_INFO",
            Self::Congestion => "TCP_CONGESTION",
            Self::CcInfo => "TCP_CC_INFO",
        }
    }
}

/// Read access to TCP-level socket options.
pub trait TcpSockOpt {
    /// Whether this host exposes `opt` at all.
    ///
    /// Readers consult this once, when they are constructed.
    fn supports(&self, opt: TcpOption) -> bool;

    /// Read `opt` from `fd` into `buf`.
    ///
    /// Returns the number of bytes the kernel wrote, which may be less than
    /// `buf.len()`. The socket is never modified.
    fn get(&self, fd: BorrowedFd<'_>, opt: TcpOption, buf: &mut [u8]) -> Result<usize>;
}

impl<T: TcpSockOpt + ?Sized> TcpSockOpt for &T {
    fn supports(&self, opt: TcpOption) -> bool {
        (**self).supports(opt)
    }

    fn get(&self, fd: BorrowedFd<'_>, opt: TcpOption, buf: &mut [u8]) -> Result<usize> {
        (**self).get(fd, opt, buf)
    }
}

/// The host kernel, reached through `getsockopt(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kernel;

#[cfg(any(target_os = "linux", target_os = "android"))]
impl TcpSockOpt for Kernel {
    fn supports(&self, _opt: TcpOption) -> bool {
        true
    }

    fn get(&self, fd: BorrowedFd<'_>, opt: TcpOption, buf: &mut [u8]) -> Result<usize> {
        use std::os::fd::AsRawFd;

        let mut len = libc::socklen_t::try_from(buf.len())
            .map_err(|_| Error::InvalidArgument("option buffer does not fit in socklen_t"))?;

        // SAFETY: buf is valid for writes of `len` bytes and outlives the call.
        // The kernel writes at most `len` bytes and stores the written length
        // back into `len`.
        let ret = unsafe {
            libc::getsockopt(
                fd.as_raw_fd(),
                libc::IPPROTO_TCP,
                opt.raw(),
                buf.as_mut_ptr().cast(),
                &mut len,
            )
        };
        if ret < 0 {
            return Err(Error::last_os_error(opt.name()));
        }

        tracing::trace!(fd = fd.as_raw_fd(), option = opt.name(), len, "getsockopt");
        Ok(len as usize)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
impl TcpSockOpt for Kernel {
    fn supports(&self, _opt: TcpOption) -> bool {
        false
    }

    fn get(&self, _fd: BorrowedFd<'_>, opt: TcpOption, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::Unsupported(opt.name()))
    }
}
