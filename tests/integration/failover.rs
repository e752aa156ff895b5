//! Upstream failover integration tests
//!
//! Mock nameservers run on loopback and are reached through the real UDP
//! exchange, so transport failures here are genuine timeouts.

use std::net::Ipv4Addr;

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;

use super::common::{blocklist_store, build_router, first_a, query, test_config, Behavior, MockNameserver};

#[tokio::test]
async fn test_failover_to_third_nameserver() {
    let servfail = MockNameserver::spawn(Behavior::Rcode(ResponseCode::ServFail)).await;
    let silent = MockNameserver::spawn(Behavior::Silent).await;
    let negative = MockNameserver::spawn(Behavior::Rcode(ResponseCode::NXDomain)).await;
    let spare = MockNameserver::spawn(Behavior::Answer(Ipv4Addr::new(192, 0, 2, 1))).await;

    let config = test_config(
        "10.10.0.0/24",
        vec![servfail.addr, silent.addr, negative.addr, spare.addr],
    );
    let router = build_router(&config, blocklist_store(&[]));

    let rsp = router
        .handle(&query("missing.example.", RecordType::AAAA))
        .await
        .unwrap();

    assert_eq!(rsp.id(), 0x4242);
    assert_eq!(rsp.response_code(), ResponseCode::NXDomain);
    assert_eq!(servfail.hits(), 1);
    assert_eq!(silent.hits(), 1);
    assert_eq!(negative.hits(), 1);
    assert_eq!(spare.hits(), 0);
}

#[tokio::test]
async fn test_first_answer_wins() {
    let primary = MockNameserver::spawn(Behavior::Answer(Ipv4Addr::new(192, 0, 2, 10))).await;
    let secondary = MockNameserver::spawn(Behavior::Answer(Ipv4Addr::new(192, 0, 2, 20))).await;

    let config = test_config("10.10.0.0/24", vec![primary.addr, secondary.addr]);
    let router = build_router(&config, blocklist_store(&[]));

    let rsp = router
        .handle(&query("example.org.", RecordType::A))
        .await
        .unwrap();

    assert_eq!(first_a(&rsp), Some(Ipv4Addr::new(192, 0, 2, 10)));
    assert_eq!(secondary.hits(), 0);
}

#[tokio::test]
async fn test_all_servfail_is_passed_through() {
    let first = MockNameserver::spawn(Behavior::Rcode(ResponseCode::ServFail)).await;
    let second = MockNameserver::spawn(Behavior::Rcode(ResponseCode::ServFail)).await;

    let config = test_config("10.10.0.0/24", vec![first.addr, second.addr]);
    let router = build_router(&config, blocklist_store(&[]));

    let rsp = router
        .handle(&query("example.org.", RecordType::MX))
        .await
        .unwrap();

    assert_eq!(rsp.response_code(), ResponseCode::ServFail);
    assert_eq!(first.hits(), 1);
    assert_eq!(second.hits(), 1);

    // An upstream SERVFAIL is a response, not a resolution failure
    let stats = router.stats().snapshot();
    assert_eq!(stats.upstream, 1);
    assert_eq!(stats.failures, 0);
}

#[tokio::test]
async fn test_unreachable_upstream_yields_servfail() {
    let first = MockNameserver::spawn(Behavior::Silent).await;
    let second = MockNameserver::spawn(Behavior::Silent).await;

    let config = test_config("10.10.0.0/24", vec![first.addr, second.addr]);
    let router = build_router(&config, blocklist_store(&[]));

    let rsp = router
        .handle(&query("example.org.", RecordType::TXT))
        .await
        .unwrap();

    assert_eq!(rsp.id(), 0x4242);
    assert_eq!(rsp.response_code(), ResponseCode::ServFail);
    assert!(rsp.answers().is_empty());
    assert_eq!(router.stats().snapshot().failures, 1);
}

#[tokio::test]
async fn test_blocklisted_name_other_types_go_upstream() {
    let upstream = MockNameserver::spawn(Behavior::Rcode(ResponseCode::NoError)).await;
    let store = blocklist_store(&["example.com"]);
    let router = build_router(&test_config("10.10.0.0/24", vec![upstream.addr]), store);

    // Only A/IN is answered with fake IPs
    let rsp = router
        .handle(&query("www.example.com.", RecordType::AAAA))
        .await
        .unwrap();

    assert_eq!(rsp.response_code(), ResponseCode::NoError);
    assert!(rsp.answers().is_empty());
    assert_eq!(upstream.hits(), 1);
    assert_eq!(router.stats().snapshot().internal, 0);
}
