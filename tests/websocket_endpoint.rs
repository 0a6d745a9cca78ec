//! Integration tests for the real-time WebSocket endpoint.
//!
//! Serves the full router on an ephemeral port and drives it with
//! `tokio-tungstenite` clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use notification_relay::adapters::http::{app_router, serve};
use notification_relay::adapters::{InMemoryBroker, LoggingEmailSender, WebSocketState};
use notification_relay::application::{
    BrokerConnector, ClientRegistry, NotificationDispatcher, NotificationRelay, SubscriptionManager,
};
use notification_relay::domain::broker::RetryPolicy;
use notification_relay::domain::notification::{Notification, RELAY_TOPICS};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// Test Infrastructure
// =============================================================================

async fn spawn_server(registry: Arc<ClientRegistry>) -> (SocketAddr, watch::Sender<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app_router(WebSocketState::new(registry));
    let (tx, mut rx) = watch::channel(false);

    tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.changed().await;
        };
        serve(listener, router, shutdown).await.unwrap();
    });

    (addr, tx)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    ws
}

async fn next_text(ws: &mut Client) -> String {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        match frame {
            Message::Text(text) => return text,
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

async fn wait_for_clients(registry: &ClientRegistry, expected: usize) {
    for _ in 0..400 {
        if registry.len().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} registered clients", expected);
}

fn registry() -> Arc<ClientRegistry> {
    Arc::new(ClientRegistry::new(Duration::from_secs(1)))
}

/// Large enough that a few unread frames fill the loopback socket buffers.
fn bulky(topic: &str) -> Notification {
    Notification::render(topic, &"x".repeat(2 * 1024 * 1024))
}

/// Read whatever the server already sent until the connection ends.
///
/// Returns false if the connection is still open after `within`.
async fn connection_ends(ws: &mut Client, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    loop {
        match tokio::time::timeout_at(deadline, ws.next()).await {
            Err(_) => return false,
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(_))) => continue,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn connecting_client_receives_missed_notification_and_buffer_empties() {
    let registry = registry();
    registry
        .deliver(Notification::render("product.created", "Widget"))
        .await;
    let (addr, _shutdown) = spawn_server(registry.clone()).await;

    let mut ws = connect(addr).await;

    assert_eq!(next_text(&mut ws).await, "[product.created] Widget");
    assert!(registry.missed().is_empty());
}

#[tokio::test]
async fn second_client_does_not_get_replayed_backlog() {
    let registry = registry();
    registry
        .deliver(Notification::render("product.created", "Widget"))
        .await;
    let (addr, _shutdown) = spawn_server(registry.clone()).await;

    let mut first = connect(addr).await;
    assert_eq!(next_text(&mut first).await, "[product.created] Widget");

    let mut second = connect(addr).await;
    wait_for_clients(&registry, 2).await;
    registry
        .deliver(Notification::render("user.created", "alice"))
        .await;

    // The first frame the second client sees is live traffic, not backlog.
    assert_eq!(next_text(&mut second).await, "[user.created] alice");
    assert_eq!(next_text(&mut first).await, "[user.created] alice");
}

#[tokio::test]
async fn broadcast_reaches_all_connected_clients() {
    let registry = registry();
    let (addr, _shutdown) = spawn_server(registry.clone()).await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    wait_for_clients(&registry, 2).await;

    registry
        .deliver(Notification::render("review.created", "5-star"))
        .await;

    assert_eq!(next_text(&mut a).await, "[review.created] 5-star");
    assert_eq!(next_text(&mut b).await, "[review.created] 5-star");
    assert!(registry.missed().is_empty());
}

#[tokio::test]
async fn client_frames_are_ignored() {
    let registry = registry();
    let (addr, _shutdown) = spawn_server(registry.clone()).await;

    let mut ws = connect(addr).await;
    wait_for_clients(&registry, 1).await;
    ws.send(Message::Text("hello relay".to_string())).await.unwrap();
    ws.send(Message::Binary(vec![1, 2, 3])).await.unwrap();

    registry
        .deliver(Notification::render("user.deleted", "bob"))
        .await;

    assert_eq!(next_text(&mut ws).await, "[user.deleted] bob");
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn closing_client_is_unregistered() {
    let registry = registry();
    let (addr, _shutdown) = spawn_server(registry.clone()).await;

    let mut ws = connect(addr).await;
    wait_for_clients(&registry, 1).await;

    ws.close(None).await.unwrap();

    wait_for_clients(&registry, 0).await;
    registry
        .deliver(Notification::render("user.created", "carol"))
        .await;
    assert_eq!(registry.missed().len(), 1);
}

#[tokio::test]
async fn broker_message_reaches_websocket_client_end_to_end() {
    let broker = Arc::new(InMemoryBroker::new());
    let connector = Arc::new(BrokerConnector::new(
        broker.clone(),
        RetryPolicy::default().with_delay(Duration::from_millis(10)),
    ));
    let registry = registry();
    let dispatcher = Arc::new(NotificationDispatcher::new(
        "in_app",
        registry.clone(),
        Arc::new(LoggingEmailSender::new("ops@example.com")),
    ));
    let subscriptions = SubscriptionManager::for_relay_topics(connector.clone(), dispatcher, 64);
    let relay = Arc::new(NotificationRelay::new(connector, subscriptions));
    relay.start().await.unwrap();

    let (relay_shutdown, relay_rx) = watch::channel(false);
    let relay_task = tokio::spawn({
        let relay = relay.clone();
        async move { relay.run(relay_rx).await }
    });
    for _ in 0..400 {
        if RELAY_TOPICS.iter().all(|t| broker.subscriber_count(t) == 1) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (addr, _shutdown) = spawn_server(registry.clone()).await;

    // Published before anyone connects: buffered, then replayed.
    broker.publish("product.created", "Widget").await;
    for _ in 0..400 {
        if registry.missed().len() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let mut ws = connect(addr).await;
    assert_eq!(next_text(&mut ws).await, "[product.created] Widget");

    broker.publish("review.created", "5-star").await;
    assert_eq!(next_text(&mut ws).await, "[review.created] 5-star");

    relay_shutdown.send(true).unwrap();
    relay_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn client_evicted_by_send_timeout_is_disconnected() {
    let registry = Arc::new(ClientRegistry::new(Duration::from_millis(50)));
    let (addr, _shutdown) = spawn_server(registry.clone()).await;

    // Never reads until the end, so its socket buffers fill up.
    let mut stalled = connect(addr).await;
    wait_for_clients(&registry, 1).await;

    let mut evicted = false;
    for _ in 0..100 {
        let report = registry.broadcast(&bulky("user.created")).await;
        if !report.failed.is_empty() {
            evicted = true;
            break;
        }
    }
    assert!(evicted, "stalled client was never evicted");
    assert!(registry.is_empty().await);

    assert!(
        connection_ends(&mut stalled, Duration::from_secs(10)).await,
        "evicted client's connection stayed open"
    );
}

#[tokio::test]
async fn failed_replay_to_stalled_client_releases_connection() {
    let registry = Arc::new(ClientRegistry::new(Duration::from_millis(50)));
    for _ in 0..16 {
        registry.deliver(bulky("product.created")).await;
    }
    let (addr, _shutdown) = spawn_server(registry.clone()).await;

    let mut stalled = connect(addr).await;
    for _ in 0..400 {
        if registry.missed().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    // Waits on the registry lock until the replay has given up.
    wait_for_clients(&registry, 0).await;

    assert!(
        connection_ends(&mut stalled, Duration::from_secs(10)).await,
        "connection stayed open after failed replay"
    );
}
