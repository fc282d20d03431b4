//! Error types for congestion-control info queries.

use std::io;

/// Result type for congestion-control info queries.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading TCP congestion-control telemetry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller broke the call contract (e.g. no destination for results).
    ///
    /// Reported before any kernel interaction.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The kernel query itself failed.
    #[error("{operation}: {message} (errno {errno})")]
    Os {
        /// The socket option that was being read.
        operation: &'static str,
        /// The raw errno value, passed through unchanged.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// The host does not expose the requested facility at all.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// The query succeeded but the record is not a `tcp_bbr_info`.
    ///
    /// The socket's congestion-control algorithm is not BBR, or the kernel
    /// uses a record shape this crate does not know.
    #[error("congestion control is not BBR ({len}-byte TCP_CC_INFO record)")]
    NotBbr {
        /// Number of bytes the kernel reported.
        len: usize,
    },

    /// A fixed-layout record was shorter than its base layout.
    #[error("record truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum record length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },
}

impl Error {
    /// Create an OS error from an errno value.
    pub fn from_errno(errno: i32, operation: &'static str) -> Self {
        let message = io::Error::from_raw_os_error(errno).to_string();
        Self::Os {
            operation,
            errno,
            message,
        }
    }

    /// Create an OS error from the calling thread's current errno.
    pub fn last_os_error(operation: &'static str) -> Self {
        let err = io::Error::last_os_error();
        Self::Os {
            operation,
            // always Some on unix
            errno: err.raw_os_error().unwrap_or(0),
            message: err.to_string(),
        }
    }

    /// Check if this error means the socket is not running BBR.
    pub fn is_not_bbr(&self) -> bool {
        matches!(self, Self::NotBbr { .. })
    }

    /// Check if this error means the facility is absent on this host.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM | libc::EACCES))
    }

    /// Check if the handle is not a usable socket (EBADF, ENOTSOCK).
    pub fn is_bad_descriptor(&self) -> bool {
        matches!(self.errno(), Some(libc::EBADF | libc::ENOTSOCK))
    }

    /// Get the errno value if this is an OS error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Os { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}
