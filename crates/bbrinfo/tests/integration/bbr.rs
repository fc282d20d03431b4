//! Integration tests for `TCP_CC_INFO` decoding.

use std::fs::File;
use std::net::UdpSocket;
use std::thread;
use std::time::Duration;

use crate::common::LoopbackPair;
use bbrinfo::{BbrReader, CcInfo, Error, get_bbr_info, read_bbr_info};

#[test]
fn test_reno_is_not_bbr() {
    let Some(mut pair) = LoopbackPair::with_congestion("reno").unwrap() else {
        return;
    };
    pair.transfer(256 * 1024).unwrap();

    let err = read_bbr_info(&pair.client).unwrap_err();
    // reno has no get_info hook: the kernel writes nothing
    assert!(matches!(err, Error::NotBbr { len: 0 }), "got {err:?}");
}

#[test]
fn test_not_bbr_leaves_destinations_untouched() {
    let Some(pair) = LoopbackPair::with_congestion("reno").unwrap() else {
        return;
    };
    let (mut bw, mut rtt) = (-1.0, -1.0);
    let err = BbrReader::new()
        .read_into(&pair.client, Some(&mut bw), Some(&mut rtt))
        .unwrap_err();
    assert!(err.is_not_bbr());
    assert_eq!((bw, rtt), (-1.0, -1.0));
}

#[test]
fn test_read_cc_info_reports_length() {
    let Some(pair) = LoopbackPair::with_congestion("reno").unwrap() else {
        return;
    };
    let info = BbrReader::new().read_cc_info(&pair.client).unwrap();
    assert_eq!(info, CcInfo::Other { len: 0 });
}

#[test]
fn test_bbr_readings() {
    let mut pair = require_bbr!();
    pair.transfer(1024 * 1024).unwrap();

    let (bandwidth, min_rtt) = get_bbr_info(&pair.client).unwrap();
    assert!(bandwidth >= 0.0);
    assert!(min_rtt >= 0.0);

    let info = read_bbr_info(&pair.client).unwrap();
    assert!(info.pacing_gain > 0);
    assert!(info.cwnd_gain > 0);
}

#[test]
fn test_bbr_read_into() {
    let mut pair = require_bbr!();
    pair.transfer(256 * 1024).unwrap();

    let (mut bw, mut rtt) = (-1.0, -1.0);
    BbrReader::new()
        .read_into(&pair.client, Some(&mut bw), Some(&mut rtt))
        .unwrap();
    assert!(bw >= 0.0);
    assert!(rtt >= 0.0);
}

#[test]
fn test_bbr_reads_are_idempotent() {
    let mut pair = require_bbr!();
    pair.transfer(256 * 1024).unwrap();
    // Let the last ACKs land so nothing advances between the two reads.
    thread::sleep(Duration::from_millis(50));

    let reader = BbrReader::new();
    let first = reader.read(&pair.client).unwrap();
    let second = reader.read(&pair.client).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_destination_on_live_socket() {
    let pair = LoopbackPair::new().unwrap();
    let mut rtt = 0.0;
    let err = BbrReader::new()
        .read_into(&pair.client, None, Some(&mut rtt))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_non_socket_is_os_error() {
    let file = File::open("/dev/null").unwrap();
    let err = read_bbr_info(&file).unwrap_err();
    assert_eq!(err.errno(), Some(libc::ENOTSOCK));
}

#[test]
fn test_udp_socket_is_os_error() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let err = read_bbr_info(&socket).unwrap_err();
    assert!(matches!(err, Error::Os { operation: "TCP_CC_INFO", .. }), "got {err:?}");
}
