//! PTR integration tests

use std::net::{IpAddr, Ipv4Addr};

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{RData, RecordType};

use rust_fakedns::resolver::reverse_name;

use super::common::{blocklist_store, build_router, first_a, query, test_config, Behavior, MockNameserver};

#[tokio::test]
async fn test_local_address_identifies_server() {
    let upstream = MockNameserver::spawn(Behavior::Rcode(ResponseCode::NXDomain)).await;
    let config = test_config("10.10.0.0/24", vec![upstream.addr])
        .with_local_address(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 53)))
        .with_server_name("gw.example.net.");
    let router = build_router(&config, blocklist_store(&[]));

    let rsp = router
        .handle(&query("53.1.168.192.in-addr.arpa.", RecordType::PTR))
        .await
        .unwrap();

    assert_eq!(rsp.response_code(), ResponseCode::NoError);
    assert_eq!(rsp.answers().len(), 1);
    assert_eq!(rsp.answers()[0].ttl(), 0);
    match rsp.answers()[0].data() {
        Some(RData::PTR(ptr)) => assert_eq!(ptr.0.to_string(), "gw.example.net."),
        other => panic!("Expected PTR record, got {other:?}"),
    }
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn test_explicit_reverse_name_identifies_server() {
    let upstream = MockNameserver::spawn(Behavior::Rcode(ResponseCode::NXDomain)).await;
    let config = test_config("10.10.0.0/24", vec![upstream.addr])
        .with_local_reverse_name("1.0.0.127.in-addr.arpa.");
    let router = build_router(&config, blocklist_store(&[]));

    let rsp = router
        .handle(&query("1.0.0.127.in-addr.arpa.", RecordType::PTR))
        .await
        .unwrap();

    assert_eq!(rsp.answers().len(), 1);
    match rsp.answers()[0].data() {
        Some(RData::PTR(ptr)) => assert_eq!(ptr.0.to_string(), "fakedns-server.local."),
        other => panic!("Expected PTR record, got {other:?}"),
    }
    assert_eq!(router.stats().snapshot().ptr, 1);
}

#[tokio::test]
async fn test_fake_ip_reverse_lookup_goes_upstream() {
    let upstream = MockNameserver::spawn(Behavior::Rcode(ResponseCode::NXDomain)).await;
    let store = blocklist_store(&["example.com"]);
    let router = build_router(&test_config("10.10.0.0/24", vec![upstream.addr]), store);

    let rsp = router
        .handle(&query("example.com.", RecordType::A))
        .await
        .unwrap();
    let fake_ip = first_a(&rsp).unwrap();
    assert_eq!(upstream.hits(), 0);

    // The mapping exists, but reverse lookups are not answered from it
    let rsp = router
        .handle(&query(&reverse_name(IpAddr::V4(fake_ip)), RecordType::PTR))
        .await
        .unwrap();

    assert_eq!(rsp.response_code(), ResponseCode::NXDomain);
    assert!(rsp.answers().is_empty());
    assert_eq!(upstream.hits(), 1);
}
