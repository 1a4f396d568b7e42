//! The connection session: discovery, connect, handshake, framed send and
//! receive, and reconnect with bounded exponential backoff.
//!
//! One tokio task owns the whole lifecycle. [`SessionState`] is mutated only
//! by that task and published to the caller as [`SessionEvent`]s, so no lock
//! guards it and the gesture path can never race a transition. Control
//! flows the other way over two channels:
//!
//! - the **input channel** carries [`ControlEvent`]s from the input pump;
//!   the flush ticker drains it into the [`EventBatcher`] and ships one
//!   frame per non-empty tick (~120 Hz). While the transport is down,
//!   arriving events are discarded — stale input is not worth replaying.
//! - the **command channel** carries [`disconnect`](SessionHandle::disconnect)
//!   and [`reset`](SessionHandle::reset). The task selects on it at every
//!   await point, so a command cancels pending sleeps and I/O immediately
//!   and no timer fires after cancellation.
//!
//! # Reconnect policy
//!
//! Every transport failure increments a consecutive-failure counter. Below
//! the limit, the session waits `backoff_base × 2^failures` (capped at
//! `backoff_cap`) and retries the cached endpoint. At the limit, it parks in
//! the terminal `Failed` state and issues no further attempts until an
//! external [`reset`](SessionHandle::reset), which clears the counter and
//! the cached endpoint and restarts discovery. A successful connect also
//! clears the counter.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use trackpad_core::batch::EventBatcher;
use trackpad_core::protocol::messages::{ControlEvent, ControlMessage, PROTOCOL_VERSION};
use trackpad_core::protocol::{encode_frame, FrameDecoder};

use crate::infrastructure::network::discovery::PeerFinder;

// ── Public types ──────────────────────────────────────────────────────────────

/// Lifecycle state of the connection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Discovering,
    Connecting,
    Connected,
    Reconnecting,
    /// Terminal: retries are exhausted. Only [`SessionHandle::reset`] leaves
    /// this state.
    Failed,
}

/// Configuration for the connection session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Service name handed to the [`PeerFinder`].
    pub service_name: String,
    /// Name advertised to the peer in the handshake.
    pub device_name: String,
    /// Cadence of the batch flush ticker.
    pub flush_interval: Duration,
    /// Upper bound on a single TCP connect attempt.
    pub connect_timeout: Duration,
    /// First reconnect delay; doubles per consecutive failure.
    pub backoff_base: Duration,
    /// Upper bound on the reconnect delay.
    pub backoff_cap: Duration,
    /// Consecutive failures after which the session parks in `Failed`.
    pub max_reconnect_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_name: "_trackpad._tcp".to_string(),
            device_name: "trackpad".to_string(),
            flush_interval: Duration::from_millis(8),
            connect_timeout: Duration::from_secs(5),
            backoff_base: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(300),
            max_reconnect_attempts: 5,
        }
    }
}

/// Events the session publishes to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    /// The peer acknowledged our handshake. Informational; message flow is
    /// not gated on it.
    HandshakeAcknowledged { success: bool, server_name: String },
    /// Any other inbound message, surfaced for the dispatcher boundary.
    PeerMessage(ControlMessage),
}

enum SessionCommand {
    Disconnect,
    Reset,
}

/// Caller-side handle to a running session.
///
/// Both methods are synchronous and never block: they enqueue a command the
/// session task observes at its next await point.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Cancels all timers and in-flight work and parks the session in
    /// `Disconnected`. Safe to call from any state, any number of times.
    pub fn disconnect(&self) {
        let _ = self.commands.send(SessionCommand::Disconnect);
    }

    /// Restarts discovery and zeroes the failure counter. This is the
    /// explicit external trigger that recovers a `Failed` session.
    pub fn reset(&self) {
        let _ = self.commands.send(SessionCommand::Reset);
    }
}

/// Factory for the session task.
pub struct ConnectionSession;

impl ConnectionSession {
    /// Spawns the session task and returns the control handle plus the
    /// event stream.
    pub fn spawn(
        config: SessionConfig,
        finder: Arc<dyn PeerFinder>,
        input: mpsc::UnboundedReceiver<ControlEvent>,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let task = SessionTask {
            config,
            finder,
            input,
            commands: command_rx,
            events: event_tx,
            state: SessionState::Disconnected,
            failures: 0,
            endpoint: None,
            batcher: EventBatcher::new(),
        };
        tokio::spawn(task.run());

        (SessionHandle { commands: command_tx }, event_rx)
    }
}

// ── Session task ──────────────────────────────────────────────────────────────

/// Whether the session loop keeps running after a step.
enum Flow {
    Continue,
    Halt,
}

/// Why the connected phase ended.
enum LinkOutcome {
    /// Transport error or EOF; feeds the reconnect path.
    Lost,
    /// Local `disconnect()`.
    LocalDisconnect,
    /// Every handle is gone; the task exits.
    Halt,
}

/// What woke an idle wait.
enum Wake {
    Elapsed,
    Command(Option<SessionCommand>),
    StaleInput,
}

struct SessionTask {
    config: SessionConfig,
    finder: Arc<dyn PeerFinder>,
    input: mpsc::UnboundedReceiver<ControlEvent>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: SessionState,
    /// Consecutive transport failures since the last successful connect.
    failures: u32,
    /// Endpoint cached from discovery; reconnects reuse it, `reset()`
    /// clears it.
    endpoint: Option<SocketAddr>,
    batcher: EventBatcher,
}

impl SessionTask {
    async fn run(mut self) {
        'session: loop {
            // Resolve an endpoint, discovering when none is cached.
            let endpoint = match self.endpoint {
                Some(endpoint) => endpoint,
                None => {
                    self.set_state(SessionState::Discovering);
                    let finder = Arc::clone(&self.finder);
                    let service = self.config.service_name.clone();
                    enum Discover {
                        Found(Option<SocketAddr>),
                        Command(Option<SessionCommand>),
                    }
                    let step = tokio::select! {
                        found = finder.find(&service) => Discover::Found(found),
                        cmd = self.commands.recv() => Discover::Command(cmd),
                    };
                    match step {
                        Discover::Found(Some(endpoint)) => {
                            info!(%endpoint, "peer found");
                            self.endpoint = Some(endpoint);
                            endpoint
                        }
                        Discover::Found(None) => {
                            warn!(service = %self.config.service_name, "no peer advertising service");
                            match self.register_failure().await {
                                Flow::Continue => continue 'session,
                                Flow::Halt => break 'session,
                            }
                        }
                        Discover::Command(cmd) => match self.handle_command(cmd).await {
                            Flow::Continue => continue 'session,
                            Flow::Halt => break 'session,
                        },
                    }
                }
            };

            // Connect, bounded by the configured timeout.
            self.set_state(SessionState::Connecting);
            enum Connect {
                Done(Result<std::io::Result<TcpStream>, tokio::time::error::Elapsed>),
                Command(Option<SessionCommand>),
            }
            let step = tokio::select! {
                result = timeout(self.config.connect_timeout, TcpStream::connect(endpoint)) => {
                    Connect::Done(result)
                }
                cmd = self.commands.recv() => Connect::Command(cmd),
            };
            let stream = match step {
                Connect::Done(Ok(Ok(stream))) => stream,
                Connect::Done(Ok(Err(e))) => {
                    warn!(%endpoint, "connect failed: {e}");
                    match self.register_failure().await {
                        Flow::Continue => continue 'session,
                        Flow::Halt => break 'session,
                    }
                }
                Connect::Done(Err(_)) => {
                    warn!(%endpoint, "connect timed out");
                    match self.register_failure().await {
                        Flow::Continue => continue 'session,
                        Flow::Halt => break 'session,
                    }
                }
                Connect::Command(cmd) => match self.handle_command(cmd).await {
                    Flow::Continue => continue 'session,
                    Flow::Halt => break 'session,
                },
            };

            if let Err(e) = stream.set_nodelay(true) {
                debug!("could not set TCP_NODELAY: {e}");
            }
            self.failures = 0;
            self.set_state(SessionState::Connected);

            match self.drive_connected(stream).await {
                LinkOutcome::Lost => match self.register_failure().await {
                    Flow::Continue => continue 'session,
                    Flow::Halt => break 'session,
                },
                LinkOutcome::LocalDisconnect => {
                    match self.park(SessionState::Disconnected).await {
                        Flow::Continue => continue 'session,
                        Flow::Halt => break 'session,
                    }
                }
                LinkOutcome::Halt => break 'session,
            }
        }
        debug!("session task exited");
    }

    /// Sends the handshake and runs the read/flush loop until the link dies
    /// or a command ends it.
    async fn drive_connected(&mut self, stream: TcpStream) -> LinkOutcome {
        let (mut reader, mut writer) = stream.into_split();

        // Input queued while the transport was down is stale; drop it.
        while self.input.try_recv().is_ok() {}
        self.batcher.discard();

        let handshake = ControlMessage::Handshake {
            device_name: self.config.device_name.clone(),
            protocol_version: PROTOCOL_VERSION,
        };
        match encode_frame(&handshake) {
            Ok(frame) => {
                if let Err(e) = writer.write_all(&frame).await {
                    warn!("failed to send handshake: {e}");
                    return LinkOutcome::Lost;
                }
            }
            Err(e) => {
                warn!("failed to encode handshake: {e}");
                return LinkOutcome::Lost;
            }
        }

        let mut decoder = FrameDecoder::new();
        let mut read_buf = vec![0u8; 4096];
        let mut flush = interval(self.config.flush_interval);
        flush.set_missed_tick_behavior(MissedTickBehavior::Skip);

        enum Link {
            Command(Option<SessionCommand>),
            Read(std::io::Result<usize>),
            Flush,
        }
        loop {
            let wake = tokio::select! {
                cmd = self.commands.recv() => Link::Command(cmd),
                result = reader.read(&mut read_buf) => Link::Read(result),
                _ = flush.tick() => Link::Flush,
            };
            match wake {
                Link::Command(None) => return LinkOutcome::Halt,
                Link::Command(Some(SessionCommand::Disconnect)) => {
                    info!("local disconnect");
                    return LinkOutcome::LocalDisconnect;
                }
                Link::Command(Some(SessionCommand::Reset)) => {
                    debug!("reset ignored while connected");
                }
                Link::Read(Ok(0)) => {
                    info!("peer closed the connection");
                    return LinkOutcome::Lost;
                }
                Link::Read(Ok(n)) => {
                    for msg in decoder.push(&read_buf[..n]) {
                        self.handle_inbound(msg);
                    }
                }
                Link::Read(Err(e)) => {
                    warn!("read error: {e}");
                    return LinkOutcome::Lost;
                }
                Link::Flush => {
                    while let Ok(event) = self.input.try_recv() {
                        self.batcher.enqueue(event);
                    }
                    if let Some(batch) = self.batcher.flush(epoch_seconds()) {
                        let count = batch.events.len();
                        match encode_frame(&batch.into()) {
                            Ok(frame) => {
                                if let Err(e) = writer.write_all(&frame).await {
                                    warn!("write error while flushing {count} events: {e}");
                                    return LinkOutcome::Lost;
                                }
                            }
                            Err(e) => {
                                // Oversized batch: dropped, not fatal.
                                warn!("failed to encode batch of {count} events: {e}");
                            }
                        }
                    }
                }
            }
        }
    }

    fn handle_inbound(&mut self, msg: ControlMessage) {
        match msg {
            ControlMessage::HandshakeAck {
                success,
                server_name,
            } => {
                info!(server = %server_name, success, "handshake acknowledged");
                let _ = self.events.send(SessionEvent::HandshakeAcknowledged {
                    success,
                    server_name,
                });
            }
            other => {
                debug!(kind = other.kind(), "message from peer");
                let _ = self.events.send(SessionEvent::PeerMessage(other));
            }
        }
    }

    /// Records a transport failure: either schedules a backoff retry or, at
    /// the attempt limit, parks in `Failed`.
    async fn register_failure(&mut self) -> Flow {
        self.failures += 1;
        if self.failures >= self.config.max_reconnect_attempts {
            warn!(
                failures = self.failures,
                "reconnect attempts exhausted, session failed"
            );
            return self.park(SessionState::Failed).await;
        }

        self.set_state(SessionState::Reconnecting);
        let delay = backoff_delay(
            self.config.backoff_base,
            self.config.backoff_cap,
            self.failures - 1,
        );
        debug!(?delay, failures = self.failures, "reconnect scheduled");

        let sleeper = sleep(delay);
        tokio::pin!(sleeper);
        loop {
            let wake = tokio::select! {
                _ = &mut sleeper => Wake::Elapsed,
                cmd = self.commands.recv() => Wake::Command(cmd),
                Some(_) = self.input.recv() => Wake::StaleInput,
            };
            match wake {
                Wake::Elapsed => return Flow::Continue,
                Wake::Command(cmd) => return self.handle_command(cmd).await,
                Wake::StaleInput => {}
            }
        }
    }

    /// Sits in `state` discarding stale input until a command moves things
    /// along. `Reset` resumes the session loop, channel closure halts it.
    async fn park(&mut self, state: SessionState) -> Flow {
        self.set_state(state);
        loop {
            let wake = tokio::select! {
                cmd = self.commands.recv() => Wake::Command(cmd),
                Some(_) = self.input.recv() => Wake::StaleInput,
            };
            match wake {
                Wake::Command(None) => return Flow::Halt,
                Wake::Command(Some(SessionCommand::Reset)) => {
                    info!("external reset, restarting discovery");
                    self.failures = 0;
                    self.endpoint = None;
                    return Flow::Continue;
                }
                Wake::Command(Some(SessionCommand::Disconnect)) => {
                    self.set_state(SessionState::Disconnected);
                }
                Wake::Elapsed | Wake::StaleInput => {}
            }
        }
    }

    async fn handle_command(&mut self, cmd: Option<SessionCommand>) -> Flow {
        match cmd {
            None => Flow::Halt,
            Some(SessionCommand::Disconnect) => {
                info!("local disconnect");
                self.park(SessionState::Disconnected).await
            }
            Some(SessionCommand::Reset) => {
                self.failures = 0;
                self.endpoint = None;
                Flow::Continue
            }
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "session state changed");
            self.state = state;
            let _ = self.events.send(SessionEvent::StateChanged(state));
        }
    }
}

/// Exponential backoff delay: `base × 2^exponent`, saturating at `cap`.
fn backoff_delay(base: Duration, cap: Duration, exponent: u32) -> Duration {
    let factor = 2u32.saturating_pow(exponent.min(16));
    base.saturating_mul(factor).min(cap)
}

/// Seconds since the Unix epoch, as a batch timestamp.
fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_documented_policy() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.flush_interval, Duration::from_millis(8));
        assert_eq!(cfg.backoff_base, Duration::from_secs(2));
        assert_eq!(cfg.backoff_cap, Duration::from_secs(300));
        assert_eq!(cfg.max_reconnect_attempts, 5);
    }

    #[test]
    fn test_backoff_delay_doubles_per_failure() {
        let base = Duration::from_secs(2);
        let cap = Duration::from_secs(300);
        assert_eq!(backoff_delay(base, cap, 0), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, cap, 1), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, cap, 2), Duration::from_secs(8));
        assert_eq!(backoff_delay(base, cap, 3), Duration::from_secs(16));
    }

    #[test]
    fn test_backoff_delay_saturates_at_cap() {
        let base = Duration::from_secs(2);
        let cap = Duration::from_secs(300);
        assert_eq!(backoff_delay(base, cap, 10), cap);
        // Absurd exponents must not overflow.
        assert_eq!(backoff_delay(base, cap, u32::MAX), cap);
    }

    #[test]
    fn test_epoch_seconds_is_positive() {
        assert!(epoch_seconds() > 0.0);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent_and_never_blocks() {
        // Arrange – a session with no reachable peer.
        let (_input_tx, input_rx) = mpsc::unbounded_channel();
        let finder = Arc::new(crate::infrastructure::network::discovery::StaticPeerFinder::new(
            "127.0.0.1:9".parse().unwrap(),
        ));
        let (handle, _events) = ConnectionSession::spawn(
            SessionConfig {
                backoff_base: Duration::from_millis(10),
                ..SessionConfig::default()
            },
            finder,
            input_rx,
        );

        // Act / Assert – repeated disconnects from any state return
        // immediately and do not panic.
        handle.disconnect();
        handle.disconnect();
        handle.disconnect();
    }
}
