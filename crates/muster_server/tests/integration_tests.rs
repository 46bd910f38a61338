//! End-to-end tests: the full front → relay → worker-pool broker over the
//! in-process channel transport, plus a handshake over real TCP sockets.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use muster_protocol::{DomainEvent, DomainNotification};
use muster_server::transport::channel::{channel_front, ChannelClient, ChannelConnector};
use muster_server::transport::tcp::{tcp_front, TcpClient};
use muster_server::world::memory::{MemoryWorldStore, WorldBounds};
use muster_server::world::WorldStore;
use muster_server::{create_server_with_config, Config, MusterServer};

const WAIT: Duration = Duration::from_secs(2);
const SILENCE: Duration = Duration::from_millis(100);

struct Harness {
    server: Arc<MusterServer>,
    connector: ChannelConnector,
}

fn start_broker(workers: usize) -> Harness {
    let mut config = Config::default();
    config.server.workers = workers;
    config.server.queue_capacity = 64;
    config.world.min_x = -100.0;
    config.world.max_x = 100.0;
    let server = Arc::new(create_server_with_config(&config));
    let (transport, connector) = channel_front(config.server.queue_capacity);

    let running = server.clone();
    tokio::spawn(async move {
        running.run(transport).await.expect("broker failed");
    });

    Harness { server, connector }
}

async fn expect_notification(client: &mut ChannelClient) -> DomainNotification {
    timeout(WAIT, client.recv_notification())
        .await
        .expect("timed out waiting for a notification")
        .expect("transport error")
        .expect("server closed the connection")
}

async fn expect_silence(client: &mut ChannelClient) {
    assert!(
        timeout(SILENCE, client.recv_unit()).await.is_err(),
        "client received an unexpected unit"
    );
}

/// Connects and joins, consuming the `Authenticated` acknowledgement so the
/// join is known to be committed before the test goes on.
async fn join(connector: &ChannelConnector, name: &str) -> ChannelClient {
    let mut client = connector.connect().await;
    client
        .send_event(&DomainEvent::Join {
            name: name.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(
        expect_notification(&mut client).await,
        DomainNotification::Authenticated
    );
    client
}

#[tokio::test(flavor = "multi_thread")]
async fn join_fans_out_to_every_other_client() {
    let harness = start_broker(2);
    let mut a = join(&harness.connector, "a").await;
    let mut b = join(&harness.connector, "b").await;
    // "a" hears about "b" joining; drain it so the assertion below is exact.
    assert_eq!(
        expect_notification(&mut a).await,
        DomainNotification::Joined { id: b.identity() }
    );

    let mut c = join(&harness.connector, "c").await;

    assert_eq!(
        expect_notification(&mut a).await,
        DomainNotification::Joined { id: c.identity() }
    );
    assert_eq!(
        expect_notification(&mut b).await,
        DomainNotification::Joined { id: c.identity() }
    );
    // Exactly one Authenticated to "c" (already consumed in join) and
    // nothing about its own join.
    expect_silence(&mut c).await;

    harness.server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn move_fan_out_excludes_the_sender() {
    let harness = start_broker(2);
    let mut a = join(&harness.connector, "a").await;
    let mut b = join(&harness.connector, "b").await;
    assert!(matches!(
        expect_notification(&mut a).await,
        DomainNotification::Joined { .. }
    ));
    let mut c = join(&harness.connector, "c").await;
    assert!(matches!(
        expect_notification(&mut a).await,
        DomainNotification::Joined { .. }
    ));
    assert!(matches!(
        expect_notification(&mut b).await,
        DomainNotification::Joined { .. }
    ));

    b.send_event(&DomainEvent::Move { x: 5.0 }).await.unwrap();

    let expected = DomainNotification::Moved {
        id: b.identity(),
        x: 5.0,
    };
    assert_eq!(expect_notification(&mut a).await, expected);
    assert_eq!(expect_notification(&mut c).await, expected);
    expect_silence(&mut b).await;

    harness.server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn leave_notifies_the_pre_removal_peer_set() {
    let harness = start_broker(2);
    let mut a = join(&harness.connector, "a").await;
    let mut b = join(&harness.connector, "b").await;
    assert!(matches!(
        expect_notification(&mut a).await,
        DomainNotification::Joined { .. }
    ));

    a.send_event(&DomainEvent::Leave).await.unwrap();

    assert_eq!(
        expect_notification(&mut b).await,
        DomainNotification::Left { id: a.identity() }
    );
    expect_silence(&mut b).await;
    expect_silence(&mut a).await;

    harness.server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_and_unknown_hint_units_produce_no_output() {
    let harness = start_broker(2);
    let mut a = join(&harness.connector, "a").await;
    let mut b = join(&harness.connector, "b").await;
    assert!(matches!(
        expect_notification(&mut a).await,
        DomainNotification::Joined { .. }
    ));

    // Missing delimiter frame entirely.
    b.send_raw(vec![]).await.unwrap();
    // Oversized hint frame.
    b.send_raw(vec![Bytes::new(), Bytes::from_static(&[0x01, 0x02])])
        .await
        .unwrap();
    // Hint outside the closed table.
    b.send_raw(vec![
        Bytes::new(),
        Bytes::from_static(&[0x7f]),
        Bytes::from_static(b"junk"),
    ])
    .await
    .unwrap();

    // No fan-out from any of it, and the broker still works afterwards.
    expect_silence(&mut a).await;
    b.send_event(&DomainEvent::Move { x: 1.5 }).await.unwrap();
    assert_eq!(
        expect_notification(&mut a).await,
        DomainNotification::Moved {
            id: b.identity(),
            x: 1.5,
        }
    );

    harness.server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn store_failure_restarts_the_worker_and_spares_other_clients() {
    // Single worker so the failing event and the follow-up hit the same
    // (restarted) instance.
    let harness = start_broker(1);
    let mut a = join(&harness.connector, "a").await;

    // Move before join: unknown entity, a domain operation failure. The
    // sender gets no reply and the worker is respawned.
    let ghost = harness.connector.connect().await;
    ghost
        .send_event(&DomainEvent::Move { x: 1.0 })
        .await
        .unwrap();
    expect_silence(&mut a).await;

    // Give the supervisor a moment to connect the replacement.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut b = join(&harness.connector, "b").await;
    assert_eq!(
        expect_notification(&mut a).await,
        DomainNotification::Joined { id: b.identity() }
    );
    expect_silence(&mut b).await;

    harness.server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn disconnected_clients_are_skipped_silently() {
    let harness = start_broker(2);
    let mut a = join(&harness.connector, "a").await;
    let b = join(&harness.connector, "b").await;
    assert!(matches!(
        expect_notification(&mut a).await,
        DomainNotification::Joined { .. }
    ));

    // "b" drops its connection without leaving; its entity stays, so fan-out
    // still targets it, and delivery silently drops.
    b.disconnect().await;

    a.send_event(&DomainEvent::Move { x: 2.0 }).await.unwrap();
    expect_silence(&mut a).await;

    // "a" still hears about new peers.
    let c = join(&harness.connector, "c").await;
    assert_eq!(
        expect_notification(&mut a).await,
        DomainNotification::Joined { id: c.identity() }
    );

    harness.server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn run_returns_after_the_transport_closes() {
    let store: Arc<dyn WorldStore> = Arc::new(MemoryWorldStore::new(WorldBounds::default()));
    let server = MusterServer::new(store, 2, 64);
    let (transport, connector) = channel_front(64);
    let broker = tokio::spawn(async move { server.run(transport).await });

    // Do real work first, so the broker is known to be fully up.
    let a = join(&connector, "a").await;

    // Once every inbound handle is gone the transport is closed and the
    // broker has nothing left to serve; run must come back on its own,
    // without anyone calling shutdown.
    a.disconnect().await;
    drop(connector);

    timeout(WAIT, broker)
        .await
        .expect("run hung after the transport closed")
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn join_handshake_over_tcp() {
    let store: Arc<dyn WorldStore> = Arc::new(MemoryWorldStore::new(WorldBounds::default()));
    let server = Arc::new(MusterServer::new(store, 2, 64));
    let (transport, addr) = tcp_front("127.0.0.1:0".parse().unwrap(), 64)
        .await
        .unwrap();
    let running = server.clone();
    tokio::spawn(async move {
        running.run(transport).await.expect("broker failed");
    });

    let mut first = TcpClient::connect(addr).await.unwrap();
    first
        .send_event(&DomainEvent::Join {
            name: "first".to_string(),
        })
        .await
        .unwrap();
    let notification = timeout(WAIT, first.recv_notification())
        .await
        .expect("timed out")
        .unwrap()
        .unwrap();
    assert_eq!(notification, DomainNotification::Authenticated);

    let mut second = TcpClient::connect(addr).await.unwrap();
    second
        .send_event(&DomainEvent::Join {
            name: "second".to_string(),
        })
        .await
        .unwrap();
    let notification = timeout(WAIT, second.recv_notification())
        .await
        .expect("timed out")
        .unwrap()
        .unwrap();
    assert_eq!(notification, DomainNotification::Authenticated);

    // The first client hears about the second.
    let notification = timeout(WAIT, first.recv_notification())
        .await
        .expect("timed out")
        .unwrap()
        .unwrap();
    assert!(matches!(notification, DomainNotification::Joined { .. }));

    server.shutdown().await;
}
