//! Connection manager, auth handshake driver, and reconnect supervisor.
//!
//! One background engine task per connection owns the socket, the
//! frame assembler, and the correlator. Callers talk to it over an
//! mpsc control channel and get their results back on per-request
//! oneshot channels, so all protocol state is mutated from a single
//! task and commands stay strictly serialized in send order.

use std::sync::{Arc, Mutex};

use futures::SinkExt;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedWrite;
use tracing::{info, warn};

use crate::chat;
use crate::codec::{FrameAssembler, RconCodec};
use crate::config::RconConfig;
use crate::error::RconError;
use crate::events::{EventBus, RconEvent};
use crate::packet::{Frame, MAX_PACKET_SIZE};
use crate::state::{ConnectionState, Correlator, Dispatch};

// ── Control channel ──────────────────────────────────────────────

enum Control {
    Auth {
        password: String,
        reply: oneshot::Sender<Result<(), RconError>>,
    },
    Execute {
        command: String,
        reply: oneshot::Sender<Result<String, RconError>>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Why the engine loop ended.
enum CloseReason {
    /// `disconnect()` was called (or the client handle was dropped).
    Explicit(Option<oneshot::Sender<()>>),
    /// The server closed the connection.
    Closed,
    /// A read or write failed.
    IoError,
    /// The server sent a frame the protocol does not allow.
    Violation,
    /// The password was rejected during the handshake.
    AuthFailed,
}

// ── Shared state ─────────────────────────────────────────────────

struct Shared {
    state: ConnectionState,
    logged_in: bool,
    auto_reconnect: bool,
    control: Option<mpsc::UnboundedSender<Control>>,
    reconnect_timer: Option<JoinHandle<()>>,
}

struct Inner {
    config: RconConfig,
    shared: Mutex<Shared>,
    events: EventBus,
}

// ── RconClient ───────────────────────────────────────────────────

/// Handle to one RCON connection.
///
/// Cheap to clone; all clones share the same connection, event bus,
/// and reconnect supervisor.
#[derive(Clone)]
pub struct RconClient {
    inner: Arc<Inner>,
}

impl RconClient {
    pub fn new(config: RconConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                shared: Mutex::new(Shared {
                    state: ConnectionState::default(),
                    logged_in: false,
                    auto_reconnect: false,
                    control: None,
                    reconnect_timer: None,
                }),
                events: EventBus::new(),
            }),
        }
    }

    /// Subscribe to push events and socket-error notifications.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RconEvent> {
        self.inner.events.subscribe()
    }

    /// `true` while a transport is open (authenticated or not).
    pub fn is_connected(&self) -> bool {
        self.inner.shared.lock().unwrap().state.is_connected()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.lock().unwrap().state.clone()
    }

    /// Open the transport and run the auth handshake.
    ///
    /// On success auto-reconnect is armed; an unexpected close will
    /// then schedule a reconnect attempt after the configured delay.
    pub async fn connect(&self) -> Result<(), RconError> {
        Inner::connect(&self.inner).await
    }

    /// Explicit, authoritative disconnect: disarms auto-reconnect,
    /// cancels any pending reconnect timer, and closes the transport.
    pub async fn disconnect(&self) -> Result<(), RconError> {
        let (control, timer) = {
            let mut shared = self.inner.shared.lock().unwrap();
            shared.auto_reconnect = false;
            (shared.control.clone(), shared.reconnect_timer.take())
        };
        if let Some(timer) = timer {
            timer.abort();
        }

        match control {
            Some(tx) => {
                let (done_tx, done_rx) = oneshot::channel();
                if tx.send(Control::Shutdown { done: done_tx }).is_ok() {
                    // Resolves once the engine has drained its state.
                    let _ = done_rx.await;
                }
            }
            None => {
                self.inner.shared.lock().unwrap().state.force_disconnect();
            }
        }
        Ok(())
    }

    /// Execute one command and return the fully reassembled response
    /// text.
    ///
    /// Commands issued concurrently are queued FIFO; responses resolve
    /// in send order.
    pub async fn execute(&self, command: &str) -> Result<String, RconError> {
        let control = {
            let shared = self.inner.shared.lock().unwrap();
            if !shared.state.is_connected() {
                return Err(RconError::NotConnected);
            }
            if !shared.logged_in {
                return Err(RconError::NotLoggedIn);
            }
            shared.control.clone().ok_or(RconError::NotConnected)?
        };

        let (tx, rx) = oneshot::channel();
        control
            .send(Control::Execute {
                command: command.to_string(),
                reply: tx,
            })
            .map_err(|_| RconError::NotConnected)?;
        rx.await.map_err(|_| RconError::Disconnected)?
    }
}

impl Inner {
    async fn connect(inner: &Arc<Inner>) -> Result<(), RconError> {
        {
            let mut shared = inner.shared.lock().unwrap();
            if !inner.config.has_endpoint() || shared.state.is_connected() {
                return Err(RconError::HostPortUndefined);
            }
            shared.state.begin_connect()?;
        }

        let host = inner.config.host.as_str();
        let port = inner.config.port;
        let stream = match TcpStream::connect((host, port)).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("failed to connect to {host}:{port}: {e}");
                inner.shared.lock().unwrap().state.force_disconnect();
                return Err(RconError::Connect(e));
            }
        };
        let _ = stream.set_nodelay(true);

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        {
            let mut shared = inner.shared.lock().unwrap();
            shared.state.transport_connected()?;
            shared.control = Some(control_tx.clone());
        }
        info!("connected to {host}:{port}, authenticating");
        tokio::spawn(run_engine(inner.clone(), stream, control_rx));

        let (tx, rx) = oneshot::channel();
        control_tx
            .send(Control::Auth {
                password: inner.config.password.clone(),
                reply: tx,
            })
            .map_err(|_| RconError::Disconnected)?;

        match rx.await {
            Ok(Ok(())) => {
                let mut shared = inner.shared.lock().unwrap();
                shared.state.authenticated().map_err(|_| RconError::Disconnected)?;
                shared.logged_in = true;
                shared.auto_reconnect = true;
                info!("authenticated to {host}:{port}");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(RconError::Disconnected),
        }
    }
}

// ── Engine ───────────────────────────────────────────────────────

type Writer = FramedWrite<OwnedWriteHalf, RconCodec>;

async fn run_engine(
    inner: Arc<Inner>,
    stream: TcpStream,
    mut control: mpsc::UnboundedReceiver<Control>,
) {
    let (mut reader, write_half) = stream.into_split();
    let mut writer = FramedWrite::new(write_half, RconCodec);
    let mut assembler = FrameAssembler::new();
    let mut correlator = Correlator::new();
    let mut chunk = vec![0u8; MAX_PACKET_SIZE];

    let reason = loop {
        tokio::select! {
            msg = control.recv() => match msg {
                Some(Control::Auth { password, reply }) => {
                    if let Err(e) = send_auth(&mut writer, &mut correlator, &password, reply).await {
                        inner.events.publish(RconEvent::SocketError(e.to_string()));
                        break CloseReason::IoError;
                    }
                }
                Some(Control::Execute { command, reply }) => {
                    if let Err(e) = send_command(&mut writer, &mut correlator, command, reply).await {
                        inner.events.publish(RconEvent::SocketError(e.to_string()));
                        break CloseReason::IoError;
                    }
                }
                Some(Control::Shutdown { done }) => break CloseReason::Explicit(Some(done)),
                None => break CloseReason::Explicit(None),
            },
            read = reader.read(&mut chunk) => match read {
                Ok(0) => break CloseReason::Closed,
                Ok(n) => match process_chunk(&inner, &mut assembler, &mut correlator, &chunk[..n]) {
                    Ok(true) => {}
                    Ok(false) => break CloseReason::AuthFailed,
                    Err(e) => {
                        warn!("{e}; closing connection");
                        break CloseReason::Violation;
                    }
                },
                Err(e) => {
                    inner.events.publish(RconEvent::SocketError(e.to_string()));
                    break CloseReason::IoError;
                }
            },
        }
    };

    finalize(&inner, assembler, correlator, reason);
}

async fn send_auth(
    writer: &mut Writer,
    correlator: &mut Correlator,
    password: &str,
    reply: oneshot::Sender<Result<(), RconError>>,
) -> Result<(), RconError> {
    let frame = Frame::auth(correlator.sequence(), password);
    if frame.encoded_len() > MAX_PACKET_SIZE {
        let _ = reply.send(Err(RconError::PacketTooLarge {
            size: frame.encoded_len(),
            max: MAX_PACKET_SIZE,
        }));
        return Ok(());
    }

    // The auth request does not advance the sequence counter.
    correlator.register_auth(reply);
    writer.send(frame).await
}

async fn send_command(
    writer: &mut Writer,
    correlator: &mut Correlator,
    command: String,
    reply: oneshot::Sender<Result<String, RconError>>,
) -> Result<(), RconError> {
    let sequence = correlator.sequence();
    let frame = Frame::command(sequence, &command);
    if frame.encoded_len() > MAX_PACKET_SIZE {
        let _ = reply.send(Err(RconError::PacketTooLarge {
            size: frame.encoded_len(),
            max: MAX_PACKET_SIZE,
        }));
        return Ok(());
    }

    // Registered before the write so a failed write still fails the
    // caller through the disconnect path, exactly once.
    correlator.register_command(command, reply);
    correlator.advance_sequence();

    writer.send(frame).await?;
    // Empty terminal frame of the same type and sequence, forcing the
    // server to terminate its reply.
    writer.send(Frame::command_end(sequence)).await
}

/// Feed one read into the assembler and dispatch every completed
/// frame. Returns `Ok(false)` when the handshake was rejected.
fn process_chunk(
    inner: &Arc<Inner>,
    assembler: &mut FrameAssembler,
    correlator: &mut Correlator,
    data: &[u8],
) -> Result<bool, RconError> {
    let frames = assembler.push(data, |sequence| correlator.is_outstanding(sequence))?;

    for frame in frames {
        match correlator.dispatch(frame)? {
            Dispatch::Handled | Dispatch::AuthOk => {}
            Dispatch::AuthFailed => return Ok(false),
            Dispatch::Chat(body) => {
                if let Some(event) = chat::classify(&body) {
                    inner.events.publish(event);
                }
            }
        }
    }
    Ok(true)
}

/// Drain all per-connection state and, for unexpected closures with
/// auto-reconnect armed, start the (single) reconnect supervisor.
fn finalize(
    inner: &Arc<Inner>,
    mut assembler: FrameAssembler,
    mut correlator: Correlator,
    reason: CloseReason,
) {
    let pending = correlator.pending_count();
    assembler.clear();
    correlator.fail_all();
    if pending > 0 {
        info!("failed {pending} in-flight requests on close");
    }

    let explicit = matches!(reason, CloseReason::Explicit(_));
    let (schedule, delay) = {
        let mut shared = inner.shared.lock().unwrap();
        shared.state.force_disconnect();
        shared.logged_in = false;
        shared.control = None;
        (
            !explicit && shared.auto_reconnect && shared.reconnect_timer.is_none(),
            inner.config.reconnect_delay(),
        )
    };

    match reason {
        CloseReason::Explicit(done) => {
            info!("disconnected");
            if let Some(done) = done {
                let _ = done.send(());
            }
        }
        CloseReason::Closed => warn!("connection closed by server"),
        CloseReason::IoError => warn!("connection lost"),
        CloseReason::Violation => warn!("connection force-closed after protocol violation"),
        CloseReason::AuthFailed => warn!("closing unauthenticated connection"),
    }

    if schedule {
        let supervisor = inner.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(delay).await;
                if !supervisor.shared.lock().unwrap().auto_reconnect {
                    break;
                }
                info!("attempting reconnect");
                match Inner::connect(&supervisor).await {
                    Ok(()) => break,
                    Err(e) => warn!("reconnect attempt failed: {e}"),
                }
            }
            supervisor.shared.lock().unwrap().reconnect_timer = None;
        });
        inner.shared.lock().unwrap().reconnect_timer = Some(handle);
    }
}
