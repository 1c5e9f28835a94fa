//! Failure injection tests for the load balancer.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod common;

#[tokio::test]
async fn test_round_robin_spreads_requests() {
    let b1 = common::start_mock_backend("b1").await;
    let b2 = common::start_mock_backend("b2").await;
    let proxy = common::start_proxy(common::proxy_config(&[b1, b2])).await;
    let client = common::client();

    let mut bodies = Vec::new();
    for _ in 0..4 {
        let res = client.get(format!("http://{}/", proxy.addr)).send().await.unwrap();
        assert_eq!(res.status(), 200);
        bodies.push(res.text().await.unwrap());
    }

    // First selection lands on index 1, then alternates.
    assert_eq!(bodies, vec!["b2", "b1", "b2", "b1"]);
    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_dead_backend_marked_and_skipped() {
    let live = common::start_mock_backend("live").await;
    let dead = common::closed_addr().await;
    // Index 1 is tried first: the dead backend.
    let proxy = common::start_proxy(common::proxy_config(&[live, dead])).await;
    let client = common::client();

    let res = client.get(format!("http://{}/", proxy.addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "live");

    let states: Vec<bool> = proxy.pool.backends().iter().map(|b| b.is_alive()).collect();
    assert_eq!(states, vec![true, false]);

    for _ in 0..5 {
        let res = client.get(format!("http://{}/", proxy.addr)).send().await.unwrap();
        assert_eq!(res.text().await.unwrap(), "live");
    }
    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_all_backends_down_returns_503() {
    let d1 = common::closed_addr().await;
    let d2 = common::closed_addr().await;
    let proxy = common::start_proxy(common::proxy_config(&[d1, d2])).await;
    let client = common::client();

    let res = client.get(format!("http://{}/any/path", proxy.addr)).send().await.unwrap();
    assert_eq!(res.status(), 503);
    assert_eq!(res.text().await.unwrap(), "Service not available.");
    assert_eq!(proxy.pool.alive_count(), 0);

    // Nothing left to try: fails straight away.
    let res = client.get(format!("http://{}/", proxy.addr)).send().await.unwrap();
    assert_eq!(res.status(), 503);
    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_5xx_is_relayed_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let backend = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (500, "boom".into())
        }
    })
    .await;
    let proxy = common::start_proxy(common::proxy_config(&[backend])).await;

    let res = common::client()
        .get(format!("http://{}/", proxy.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), "boom");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(proxy.pool.alive_count(), 1);
    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_request_forwarded_with_path_query_and_client_ip() {
    let echo = common::start_echo_backend().await;
    let mut config = common::proxy_config(&[]);
    config.backends = vec![format!("http://{}/api", echo).as_str().into()];
    let proxy = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{}/items?page=2", proxy.addr))
        .header("x-custom", "kept")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let head = res.text().await.unwrap().to_lowercase();
    assert!(head.starts_with("get /api/items?page=2 http/1.1"), "head: {}", head);
    assert!(head.contains("x-custom: kept"), "head: {}", head);
    assert!(head.contains("x-forwarded-for: 127.0.0.1"), "head: {}", head);
    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_health_check_eviction_and_recovery() {
    let b1 = common::start_mock_backend("b1").await;
    let b2 = common::closed_addr().await;

    let mut config = common::proxy_config(&[b1, b2]);
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    let proxy = common::start_proxy(config).await;

    // Backends start alive; the first check runs one interval in.
    assert_eq!(proxy.pool.alive_count(), 2);
    tokio::time::sleep(Duration::from_millis(1600)).await;
    let states: Vec<bool> = proxy.pool.backends().iter().map(|b| b.is_alive()).collect();
    assert_eq!(states, vec![true, false]);

    // Bring b2 up on its old port; the next check revives it.
    let serving = Arc::new(AtomicBool::new(true));
    let listener = tokio::net::TcpListener::bind(b2).await.unwrap();
    let s = serving.clone();
    tokio::spawn(async move {
        while s.load(Ordering::SeqCst) {
            if listener.accept().await.is_err() {
                break;
            }
        }
    });

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(proxy.pool.alive_count(), 2);

    serving.store(false, Ordering::SeqCst);
    proxy.shutdown.trigger();
}
