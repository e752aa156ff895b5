//! Fake-IP allocation integration tests
//!
//! # Test Categories
//!
//! 1. **Determinism**: candidates follow the allocation counter
//! 2. **Pairing**: both mappings exist with the same expiry window
//! 3. **Cache**: repeated queries reuse the mapping without touching the counter
//! 4. **Concurrency**: distinct domains never share an address
//! 5. **Exhaustion**: wrap-around onto a live address fails the query

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;

use rust_fakedns::store::CacheStore;
use rust_fakedns::QueryRouter;

use super::common::{
    blocklist_store, build_router, first_a, query, test_config, Behavior, MockNameserver,
};

/// Never contacted by tests that only query blocklisted names
fn unused_nameserver() -> Vec<SocketAddr> {
    vec!["127.0.0.1:9".parse().unwrap()]
}

// ============================================================================
// Determinism
// ============================================================================

#[tokio::test]
async fn test_first_allocations_follow_counter() {
    let store = blocklist_store(&["example.com", "example.net"]);
    let router = build_router(&test_config("10.10.0.0/24", unused_nameserver()), store);

    let first = router
        .handle(&query("www.example.com.", RecordType::A))
        .await
        .unwrap();
    let second = router
        .handle(&query("example.net.", RecordType::A))
        .await
        .unwrap();

    assert_eq!(first_a(&first), Some(Ipv4Addr::new(10, 10, 0, 1)));
    assert_eq!(first_a(&second), Some(Ipv4Addr::new(10, 10, 0, 2)));
}

#[tokio::test]
async fn test_new_allocation_answers_with_mapping_ttl() {
    let store = blocklist_store(&["example.com"]);
    let config = test_config("10.10.0.0/24", unused_nameserver())
        .with_mapping_ttl(Duration::from_secs(3600));
    let router = build_router(&config, store);

    let rsp = router
        .handle(&query("example.com.", RecordType::A))
        .await
        .unwrap();

    assert_eq!(rsp.response_code(), ResponseCode::NoError);
    assert_eq!(rsp.id(), 0x4242);
    assert_eq!(rsp.answers().len(), 1);
    assert_eq!(rsp.answers()[0].ttl(), 3600);
    assert_eq!(rsp.answers()[0].name().to_string(), "example.com.");
}

// ============================================================================
// Pairing
// ============================================================================

#[tokio::test]
async fn test_allocation_writes_both_mappings() {
    let store = blocklist_store(&["example.com"]);
    let router = build_router(&test_config("10.10.0.0/24", unused_nameserver()), store.clone());

    let rsp = router
        .handle(&query("www.example.com.", RecordType::A))
        .await
        .unwrap();
    let ip = first_a(&rsp).unwrap();

    let forward = store.get("fakedns:domain:www.example.com.").await.unwrap();
    let reverse = store.get(&format!("fakedns:ip:{ip}")).await.unwrap();
    assert_eq!(forward, Some(ip.to_string()));
    assert_eq!(reverse.as_deref(), Some("www.example.com."));

    let forward_ttl = store
        .ttl("fakedns:domain:www.example.com.")
        .await
        .unwrap()
        .unwrap();
    let reverse_ttl = store.ttl(&format!("fakedns:ip:{ip}")).await.unwrap().unwrap();
    let skew = forward_ttl.max(reverse_ttl) - forward_ttl.min(reverse_ttl);
    assert!(skew < Duration::from_secs(1), "mapping TTLs diverge by {skew:?}");

    // The proxy-side lookup sees the same pairing
    assert!(router.internal().is_fake_ip(ip));
    assert_eq!(
        router.internal().lookup_domain(ip).await.unwrap().as_deref(),
        Some("www.example.com.")
    );
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn test_repeated_query_reuses_mapping() {
    let store = blocklist_store(&["example.com"]);
    let router = build_router(&test_config("10.10.0.0/24", unused_nameserver()), store.clone());

    let first = router
        .handle(&query("example.com.", RecordType::A))
        .await
        .unwrap();
    let second = router
        .handle(&query("example.com.", RecordType::A))
        .await
        .unwrap();

    assert_eq!(first_a(&first), first_a(&second));
    assert!(second.answers()[0].ttl() <= first.answers()[0].ttl());
    assert_eq!(
        store.get("fakedns:current-ip").await.unwrap().as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn test_mapping_is_shared_between_routers() {
    let store = blocklist_store(&["example.com"]);
    let config = test_config("10.10.0.0/24", unused_nameserver());
    let a = build_router(&config, store.clone());
    let b = build_router(&config, store.clone());

    let from_a = a.handle(&query("example.com.", RecordType::A)).await.unwrap();
    let from_b = b.handle(&query("example.com.", RecordType::A)).await.unwrap();

    assert_eq!(first_a(&from_a), first_a(&from_b));
    assert_eq!(
        store.get("fakedns:current-ip").await.unwrap().as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn test_unlisted_name_is_forwarded_without_allocation() {
    let upstream = MockNameserver::spawn(Behavior::Answer(Ipv4Addr::new(93, 184, 216, 34))).await;
    let store = blocklist_store(&["example.com"]);
    let router = build_router(&test_config("10.10.0.0/24", vec![upstream.addr]), store.clone());

    let rsp = router
        .handle(&query("example.org.", RecordType::A))
        .await
        .unwrap();

    assert_eq!(first_a(&rsp), Some(Ipv4Addr::new(93, 184, 216, 34)));
    assert_eq!(rsp.answers()[0].ttl(), 300);
    assert_eq!(upstream.hits(), 1);
    assert_eq!(store.get("fakedns:current-ip").await.unwrap(), None);
    assert_eq!(store.get("fakedns:domain:example.org.").await.unwrap(), None);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_allocations_are_distinct() {
    const DOMAINS: usize = 100;

    let names: Vec<String> = (0..DOMAINS).map(|i| format!("site{i}.com")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let store = blocklist_store(&refs);
    let router = Arc::new(build_router(
        &test_config("10.20.0.0/24", unused_nameserver()),
        store.clone(),
    ));

    let tasks: Vec<_> = names
        .iter()
        .map(|name| {
            let router: Arc<QueryRouter> = Arc::clone(&router);
            let qname = format!("{name}.");
            tokio::spawn(async move {
                let rsp = router.handle(&query(&qname, RecordType::A)).await.unwrap();
                first_a(&rsp).unwrap()
            })
        })
        .collect();

    let mut addresses = HashSet::new();
    for task in tasks {
        assert!(addresses.insert(task.await.unwrap()), "address handed out twice");
    }

    assert_eq!(addresses.len(), DOMAINS);
    assert_eq!(
        store.get("fakedns:current-ip").await.unwrap(),
        Some(DOMAINS.to_string())
    );
    assert_eq!(router.stats().snapshot().failures, 0);
}

// ============================================================================
// Exhaustion
// ============================================================================

#[tokio::test]
async fn test_wraparound_onto_live_address_fails() {
    let store = blocklist_store(&["a.com", "b.com", "c.com", "d.com", "e.com"]);
    // Four addresses: counters 1..=4 hand out .1, .2, .3, .0
    let router = build_router(&test_config("10.30.0.0/30", unused_nameserver()), store.clone());

    let mut handed_out = Vec::new();
    for name in ["a.com.", "b.com.", "c.com.", "d.com."] {
        let rsp = router.handle(&query(name, RecordType::A)).await.unwrap();
        handed_out.push(first_a(&rsp).unwrap());
    }
    assert_eq!(
        handed_out,
        vec![
            Ipv4Addr::new(10, 30, 0, 1),
            Ipv4Addr::new(10, 30, 0, 2),
            Ipv4Addr::new(10, 30, 0, 3),
            Ipv4Addr::new(10, 30, 0, 0),
        ]
    );

    // Counter 5 lands on .1 again, still owned by a.com.
    let rsp = router.handle(&query("e.com.", RecordType::A)).await.unwrap();
    assert_eq!(rsp.response_code(), ResponseCode::ServFail);
    assert!(rsp.answers().is_empty());
    assert_eq!(store.get("fakedns:domain:e.com.").await.unwrap(), None);
    assert_eq!(
        store.get("fakedns:ip:10.30.0.1").await.unwrap().as_deref(),
        Some("a.com.")
    );
    assert_eq!(router.stats().snapshot().failures, 1);
}
