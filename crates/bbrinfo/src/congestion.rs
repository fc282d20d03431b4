//! Name of the active congestion-control algorithm (`TCP_CONGESTION`).

use std::os::fd::AsFd;

use crate::error::{Error, Result};
use crate::sockopt::{Kernel, TcpOption, TcpSockOpt};

/// `TCP_CA_NAME_MAX` from linux/tcp.h.
const TCP_CA_NAME_MAX: usize = 16;

/// Read the congestion-control algorithm name through `source`.
pub fn read_congestion_with<S: TcpSockOpt>(source: &S, fd: impl AsFd) -> Result<String> {
    if !source.supports(TcpOption::Congestion) {
        return Err(Error::Unsupported(TcpOption::Congestion.name()));
    }

    let mut buf = [0u8; TCP_CA_NAME_MAX];
    let len = source.get(fd.as_fd(), TcpOption::Congestion, &mut buf)?;
    Ok(parse_name(&buf[..len.min(buf.len())]))
}

/// Read the congestion-control algorithm name of a TCP socket, e.g. `"bbr"`.
pub fn read_congestion(fd: impl AsFd) -> Result<String> {
    read_congestion_with(&Kernel, fd)
}

fn parse_name(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}
