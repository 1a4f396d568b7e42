//! Integration tests for the connection session.
//!
//! These tests exercise the session through its public API against real TCP
//! sockets on the loopback interface: a peer stub accepts the connection,
//! answers the handshake, and records every decoded message. Reconnect
//! timings are shrunk to milliseconds so the bounded-retry path runs in
//! test time.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

use trackpad_controller::infrastructure::network::{
    ConnectionSession, SessionConfig, SessionEvent, SessionState, StaticPeerFinder,
};
use trackpad_core::protocol::messages::{ControlEvent, ControlMessage, PROTOCOL_VERSION};
use trackpad_core::protocol::{encode_frame, FrameDecoder};

fn test_config() -> SessionConfig {
    SessionConfig {
        device_name: "itest-pad".to_string(),
        flush_interval: Duration::from_millis(4),
        connect_timeout: Duration::from_millis(500),
        backoff_base: Duration::from_millis(10),
        backoff_cap: Duration::from_millis(50),
        max_reconnect_attempts: 3,
        ..SessionConfig::default()
    }
}

async fn recv_event(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event channel closed")
}

async fn wait_for_state(rx: &mut mpsc::UnboundedReceiver<SessionEvent>, target: SessionState) {
    loop {
        if let SessionEvent::StateChanged(state) = recv_event(rx).await {
            if state == target {
                return;
            }
        }
    }
}

/// An address that refuses connections: bind an ephemeral port, then free it.
async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Accepts one connection on `listener`, acks the handshake, and forwards
/// every decoded message.
fn spawn_peer_stub_on(listener: TcpListener) -> mpsc::UnboundedReceiver<ControlMessage> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let (mut stream, _) = match listener.accept().await {
            Ok(pair) => pair,
            Err(_) => return,
        };
        let mut decoder = FrameDecoder::new();
        let mut buf = vec![0u8; 4096];
        loop {
            let n = match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            for msg in decoder.push(&buf[..n]) {
                if matches!(msg, ControlMessage::Handshake { .. }) {
                    let ack = ControlMessage::HandshakeAck {
                        success: true,
                        server_name: "stub-peer".to_string(),
                    };
                    if stream
                        .write_all(&encode_frame(&ack).unwrap())
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                if tx.send(msg).is_err() {
                    return;
                }
            }
        }
    });
    rx
}

async fn spawn_peer_stub() -> (SocketAddr, mpsc::UnboundedReceiver<ControlMessage>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (addr, spawn_peer_stub_on(listener))
}

// ── Bounded retries ───────────────────────────────────────────────────────────

/// After exactly `max_reconnect_attempts` consecutive transport failures the
/// session parks in `Failed` and issues no further attempts until reset.
#[tokio::test]
async fn test_exhausted_retries_reach_failed_and_stop() {
    // Arrange – every connect attempt is refused.
    let addr = refused_addr().await;
    let finder = Arc::new(StaticPeerFinder::new(addr));
    let (_input_tx, input_rx) = mpsc::unbounded_channel();
    let (handle, mut events) = ConnectionSession::spawn(test_config(), finder, input_rx);

    // Act – count connection attempts until the terminal state.
    let mut connecting = 0;
    loop {
        match recv_event(&mut events).await {
            SessionEvent::StateChanged(SessionState::Connecting) => connecting += 1,
            SessionEvent::StateChanged(SessionState::Failed) => break,
            _ => {}
        }
    }

    // Assert – exactly the configured number of attempts were made.
    assert_eq!(connecting, 3, "one Connecting per allowed attempt");

    // And the session is quiescent: no further attempts, no state changes.
    let quiet = timeout(Duration::from_millis(200), events.recv()).await;
    assert!(quiet.is_err(), "no activity may follow Failed, got {quiet:?}");

    // An external reset restarts discovery from scratch.
    handle.reset();
    wait_for_state(&mut events, SessionState::Discovering).await;

    handle.disconnect();
}

// ── Happy path ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_sends_handshake_and_surfaces_ack() {
    // Arrange
    let (addr, mut received) = spawn_peer_stub().await;
    let finder = Arc::new(StaticPeerFinder::new(addr));
    let (_input_tx, input_rx) = mpsc::unbounded_channel();
    let (handle, mut events) = ConnectionSession::spawn(test_config(), finder, input_rx);

    // Assert – the stub's first message is our handshake.
    let first = timeout(Duration::from_secs(5), received.recv())
        .await
        .expect("timed out waiting for handshake")
        .expect("stub closed");
    assert_eq!(
        first,
        ControlMessage::Handshake {
            device_name: "itest-pad".to_string(),
            protocol_version: PROTOCOL_VERSION,
        }
    );

    // And the ack comes back as an informational session event.
    loop {
        match recv_event(&mut events).await {
            SessionEvent::HandshakeAcknowledged {
                success,
                server_name,
            } => {
                assert!(success);
                assert_eq!(server_name, "stub-peer");
                break;
            }
            SessionEvent::StateChanged(_) => {}
            other => panic!("unexpected event before ack: {other:?}"),
        }
    }

    handle.disconnect();
}

#[tokio::test]
async fn test_enqueued_events_arrive_batched_in_order_exactly_once() {
    // Arrange – a connected session.
    let (addr, mut received) = spawn_peer_stub().await;
    let finder = Arc::new(StaticPeerFinder::new(addr));
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (handle, mut events) = ConnectionSession::spawn(test_config(), finder, input_rx);

    // Wait until the handshake ack confirms the link is fully up.
    loop {
        if matches!(
            recv_event(&mut events).await,
            SessionEvent::HandshakeAcknowledged { .. }
        ) {
            break;
        }
    }

    // Act – enqueue a burst of distinguishable events.
    let sent: Vec<ControlEvent> = (0..25)
        .map(|i| ControlEvent::Move {
            dx: i as f32,
            dy: -(i as f32),
        })
        .collect();
    for event in &sent {
        input_tx.send(event.clone()).unwrap();
    }

    // Assert – concatenating the received batches reproduces the enqueue
    // sequence exactly: no loss, no duplication, order preserved.
    let mut got = Vec::new();
    while got.len() < sent.len() {
        match timeout(Duration::from_secs(5), received.recv())
            .await
            .expect("timed out waiting for batch")
            .expect("stub closed")
        {
            ControlMessage::Batch { events, .. } => got.extend(events),
            ControlMessage::Handshake { .. } => {}
            other => panic!("unexpected message: {other:?}"),
        }
    }
    assert_eq!(got, sent);

    handle.disconnect();
}

#[tokio::test]
async fn test_stale_input_is_discarded_not_replayed() {
    // Arrange – queue input before any connection exists.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    input_tx
        .send(ControlEvent::Text {
            value: "stale".to_string(),
        })
        .unwrap();

    let mut received = spawn_peer_stub_on(listener);
    let finder = Arc::new(StaticPeerFinder::new(addr));
    let (handle, mut events) = ConnectionSession::spawn(test_config(), finder, input_rx);

    loop {
        if matches!(
            recv_event(&mut events).await,
            SessionEvent::HandshakeAcknowledged { .. }
        ) {
            break;
        }
    }

    // Act – the first event sent after the link is up.
    let fresh = ControlEvent::Text {
        value: "fresh".to_string(),
    };
    input_tx.send(fresh.clone()).unwrap();

    // Assert – the first batch contains only the fresh event; the stale one
    // queued before the connection never reaches the wire.
    loop {
        match timeout(Duration::from_secs(5), received.recv())
            .await
            .expect("timed out waiting for batch")
            .expect("stub closed")
        {
            ControlMessage::Handshake { .. } => {}
            ControlMessage::Batch { events, .. } => {
                assert_eq!(events, vec![fresh]);
                break;
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    handle.disconnect();
}

// ── Local disconnect ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_disconnect_while_connected_closes_stream_and_parks() {
    // Arrange – a connected session.
    let (addr, mut received) = spawn_peer_stub().await;
    let finder = Arc::new(StaticPeerFinder::new(addr));
    let (_input_tx, input_rx) = mpsc::unbounded_channel();
    let (handle, mut events) = ConnectionSession::spawn(test_config(), finder, input_rx);
    wait_for_state(&mut events, SessionState::Connected).await;

    // Act
    handle.disconnect();

    // Assert – the session reports Disconnected without passing through the
    // reconnect path.
    loop {
        match recv_event(&mut events).await {
            SessionEvent::StateChanged(SessionState::Disconnected) => break,
            SessionEvent::StateChanged(SessionState::Reconnecting) => {
                panic!("local disconnect must not trigger reconnection")
            }
            _ => {}
        }
    }

    // The stub observes EOF: after draining the handshake its channel closes.
    loop {
        match timeout(Duration::from_secs(5), received.recv())
            .await
            .expect("timed out waiting for stub EOF")
        {
            None => break,
            Some(ControlMessage::Handshake { .. }) => {}
            Some(other) => panic!("unexpected message: {other:?}"),
        }
    }

    // A second disconnect is a harmless no-op.
    handle.disconnect();
}
