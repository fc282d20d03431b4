//! Integration tests for combined snapshots.

use crate::common::LoopbackPair;
use bbrinfo::ConnInfo;

#[test]
fn test_snapshot_without_bbr() {
    let Some(mut pair) = LoopbackPair::with_congestion("reno").unwrap() else {
        return;
    };
    pair.transfer(64 * 1024).unwrap();

    let snap = ConnInfo::new().snapshot(&pair.client).unwrap();
    assert!(snap.bbr.is_none());
    assert!(snap.tcp.snd_cwnd > 0);
}

#[test]
fn test_snapshot_with_bbr() {
    let mut pair = require_bbr!();
    pair.transfer(256 * 1024).unwrap();

    let snap = ConnInfo::new().snapshot(&pair.client).unwrap();
    assert!(snap.bbr.is_some());
    assert!(snap.tcp.rtt > 0);
}

#[tokio::test]
async fn test_snapshot_of_tokio_stream() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (client, accepted) = tokio::join!(tokio::net::TcpStream::connect(addr), listener.accept());
    let client = client.unwrap();
    let (_server, _) = accepted.unwrap();

    let snap = ConnInfo::new().snapshot(&client).unwrap();
    assert_eq!(snap.tcp.state, 1);
}

#[cfg(feature = "serde")]
#[test]
fn test_snapshot_serializes() {
    let pair = LoopbackPair::new().unwrap();
    let snap = ConnInfo::new().snapshot(&pair.client).unwrap();
    let json = serde_json::to_value(&snap).unwrap();
    assert!(json.get("tcp").is_some());
    assert!(json.get("bbr").is_some());
}
