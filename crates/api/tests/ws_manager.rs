//! Unit tests for `WsManager`.
//!
//! These exercise the session registry directly, without performing any
//! HTTP upgrades.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use roadsign_api::ws::{start_heartbeat, WsManager};

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();

    let _rx1 = manager.add("conn-1".to_string(), None).await;
    let _rx2 = manager.add("conn-2".to_string(), Some(7)).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn remove_unknown_id_is_noop() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string(), None).await;
    manager.remove("nonexistent").await;

    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn sender_reaches_only_its_own_connection() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string(), None).await;
    let mut rx2 = manager.add("conn-2".to_string(), None).await;

    let sender = manager.sender("conn-1").await.expect("conn-1 is registered");
    sender.send(Message::Text("frame result".into())).unwrap();

    let msg = rx1.recv().await.expect("rx1 should receive the message");
    assert!(matches!(&msg, Message::Text(t) if *t == "frame result"));
    assert!(rx2.try_recv().is_err(), "conn-2 must not see conn-1 traffic");

    assert!(manager.sender("nonexistent").await.is_none());
}

#[tokio::test]
async fn ping_all_pings_every_connection() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string(), None).await;
    let mut rx2 = manager.add("conn-2".to_string(), None).await;

    assert_eq!(manager.ping_all().await, 2);

    for rx in [&mut rx1, &mut rx2] {
        let msg = rx.recv().await.expect("should receive Ping");
        assert!(matches!(msg, Message::Ping(_)), "Expected Ping, got: {msg:?}");
    }
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string(), None).await;
    let mut rx2 = manager.add("conn-2".to_string(), None).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);

    let msg1 = rx1.recv().await.expect("rx1 should receive Close");
    assert!(
        matches!(msg1, Message::Close(None)),
        "Expected Close(None), got: {msg1:?}"
    );
    let msg2 = rx2.recv().await.expect("rx2 should receive Close");
    assert!(matches!(msg2, Message::Close(None)));

    // The manager dropped its senders, so the channel is now closed.
    assert!(
        rx1.recv().await.is_none(),
        "Channel should be closed after shutdown"
    );
}

#[tokio::test]
async fn ping_all_skips_sessions_whose_receiver_is_gone() {
    let manager = WsManager::new();

    let _rx1 = manager.add("conn-1".to_string(), None).await;
    drop(manager.add("conn-2".to_string(), None).await);

    assert_eq!(manager.ping_all().await, 1);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_pings_once_per_period() {
    let manager = Arc::new(WsManager::new());
    let mut rx = manager.add("conn-1".to_string(), None).await;
    let heartbeat = start_heartbeat(Arc::clone(&manager), Duration::from_secs(30));

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert!(rx.try_recv().is_err(), "no ping before the first period");

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(matches!(rx.try_recv(), Ok(Message::Ping(_))));
    assert!(rx.try_recv().is_err(), "exactly one ping per period");

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(matches!(rx.try_recv(), Ok(Message::Ping(_))));

    heartbeat.abort();
}
