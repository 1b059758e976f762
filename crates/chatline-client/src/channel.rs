//! The chat channel manager.
//!
//! `ChannelManager` owns the one chat channel of a client: it connects,
//! dispatches inbound frames to subscribers, writes outbound messages, and
//! reconnects after a fixed delay whenever the connection is lost. It never
//! gives up.
//!
//! The transport is owned by a driver task. The manager handle talks to it
//! over a command channel and observes its state through a `watch` channel,
//! so the UI never touches the transport directly.
//!
//! ```text
//! Closed ──connect()──▶ Connecting ──established──▶ Open
//!    ▲                      │                        │
//!    └──── delay ◀── failed ┘◀────────── lost ───────┘
//! ```

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use chatline_core::codec::{decode_inbound, encode_outbound};
use chatline_core::{ChannelState, ChatMessage, Connector, FrameTransport, InboundFrame, OutgoingMessage, PresenceEvent};

use crate::gate::Session;

/// Delay between losing the channel and the next connect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Channel manager settings.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub reconnect_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

type MessageCallback = Box<dyn Fn(&ChatMessage) + Send + Sync>;
type PresenceCallback = Box<dyn Fn(&PresenceEvent) + Send + Sync>;
type StateCallback = Box<dyn Fn(ChannelState) + Send + Sync>;

/// Registered subscribers, invoked in registration order.
///
/// Callbacks run on the driver task while the registry is read-locked; a
/// callback must not register further subscribers.
#[derive(Default)]
struct Subscribers {
    message: Vec<MessageCallback>,
    presence: Vec<PresenceCallback>,
    state: Vec<StateCallback>,
}

enum Command {
    Send { frame: String, ack: oneshot::Sender<bool> },
    Shutdown,
}

/// Owner of the chat channel lifecycle.
pub struct ChannelManager {
    connector: Arc<dyn Connector>,
    config: ChannelConfig,
    subscribers: Arc<RwLock<Subscribers>>,
    state_rx: watch::Receiver<ChannelState>,
    /// Taken by the first `connect()`.
    state_tx: Option<watch::Sender<ChannelState>>,
    commands: Option<mpsc::Sender<Command>>,
    driver: Option<JoinHandle<()>>,
}

impl ChannelManager {
    pub fn new(connector: impl Connector, config: ChannelConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(ChannelState::Closed);
        Self {
            connector: Arc::new(connector),
            config,
            subscribers: Arc::new(RwLock::new(Subscribers::default())),
            state_rx,
            state_tx: Some(state_tx),
            commands: None,
            driver: None,
        }
    }

    /// Subscribe to inbound chat messages.
    pub fn on_message(&self, callback: impl Fn(&ChatMessage) + Send + Sync + 'static) {
        if let Ok(mut subs) = self.subscribers.write() {
            subs.message.push(Box::new(callback));
        }
    }

    /// Subscribe to roster snapshots. Each one replaces the previous roster.
    pub fn on_presence(&self, callback: impl Fn(&PresenceEvent) + Send + Sync + 'static) {
        if let Ok(mut subs) = self.subscribers.write() {
            subs.presence.push(Box::new(callback));
        }
    }

    /// Subscribe to channel state transitions.
    pub fn on_state_change(&self, callback: impl Fn(ChannelState) + Send + Sync + 'static) {
        if let Ok(mut subs) = self.subscribers.write() {
            subs.state.push(Box::new(callback));
        }
    }

    /// Current channel state.
    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// A read-only view of state changes, for awaiting a given state.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Start the channel. Requires a verified session.
    ///
    /// Returns immediately; the transition to `Open` is observed through the
    /// state subscribers. Only the first call has an effect.
    pub fn connect(&mut self, session: &Session) {
        let Some(state_tx) = self.state_tx.take() else {
            warn!("chat channel already started, ignoring connect()");
            return;
        };

        info!(username = session.username().unwrap_or("<unnamed>"), "starting chat channel");

        let (command_tx, command_rx) = mpsc::channel(64);
        let driver = Driver {
            connector: self.connector.clone(),
            reconnect_delay: self.config.reconnect_delay,
            commands: command_rx,
            state: StateCell {
                tx: state_tx,
                subscribers: self.subscribers.clone(),
            },
            subscribers: self.subscribers.clone(),
        };

        self.commands = Some(command_tx);
        self.driver = Some(tokio::spawn(driver.run()));
    }

    /// Send a chat message.
    ///
    /// While the channel is not `Open` this is a silent no-op returning
    /// `false`, and nothing reaches the transport. Returns `true` once the
    /// transport has accepted the frame.
    pub async fn send(&self, message: &OutgoingMessage) -> bool {
        if !self.is_open() {
            debug!(state = %self.state(), "channel not open, dropping outbound message");
            return false;
        }
        let Some(commands) = &self.commands else {
            return false;
        };

        let frame = match encode_outbound(message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("failed to encode outbound message: {}", e);
                return false;
            }
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        if commands.send(Command::Send { frame, ack: ack_tx }).await.is_err() {
            return false;
        }
        ack_rx.await.unwrap_or(false)
    }

    /// Tear the channel down for good: close the transport and stop
    /// reconnecting. Ends in `Closed`.
    pub async fn shutdown(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(Command::Shutdown).await;
        }
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
        }
    }
}

impl Drop for ChannelManager {
    fn drop(&mut self) {
        if let Some(h) = self.driver.take() {
            h.abort();
        }
    }
}

// ── Driver ───────────────────────────────────────────────────────────

/// Publishes state to the watch channel and the state subscribers.
struct StateCell {
    tx: watch::Sender<ChannelState>,
    subscribers: Arc<RwLock<Subscribers>>,
}

impl StateCell {
    fn set(&self, next: ChannelState) {
        let prev = self.tx.send_replace(next);
        if prev == next {
            return;
        }
        debug!("chat channel {} -> {}", prev, next);
        if let Ok(subs) = self.subscribers.read() {
            for callback in &subs.state {
                callback(next);
            }
        }
    }
}

enum Exit {
    Lost,
    Shutdown,
}

struct Driver {
    connector: Arc<dyn Connector>,
    reconnect_delay: Duration,
    commands: mpsc::Receiver<Command>,
    state: StateCell,
    subscribers: Arc<RwLock<Subscribers>>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            self.state.set(ChannelState::Connecting);

            let attempt = tokio::select! {
                result = self.connector.connect() => result,
                _ = Self::refuse_until_shutdown(&mut self.commands) => {
                    self.state.set(ChannelState::Closed);
                    return;
                }
            };

            match attempt {
                Ok(transport) => {
                    self.state.set(ChannelState::Open);
                    if let Exit::Shutdown = self.run_open(transport).await {
                        self.state.set(ChannelState::Closed);
                        return;
                    }
                }
                Err(e) => info!("chat channel connect failed: {}", e),
            }

            self.state.set(ChannelState::Closed);
            info!("reconnecting chat channel in {:?}", self.reconnect_delay);

            tokio::select! {
                _ = time::sleep(self.reconnect_delay) => {}
                _ = Self::refuse_until_shutdown(&mut self.commands) => return,
            }
        }
    }

    /// Pump frames while the channel is open.
    async fn run_open(&mut self, mut transport: Box<dyn FrameTransport>) -> Exit {
        loop {
            tokio::select! {
                frame = transport.recv_text() => match frame {
                    Ok(Some(text)) => self.dispatch(&text),
                    Ok(None) => {
                        info!("chat channel closed by server");
                        return Exit::Lost;
                    }
                    Err(e) => {
                        info!("chat channel lost: {}", e);
                        return Exit::Lost;
                    }
                },

                command = self.commands.recv() => match command {
                    Some(Command::Send { frame, ack }) => {
                        match transport.send_text(&frame).await {
                            Ok(()) => {
                                let _ = ack.send(true);
                            }
                            Err(e) => {
                                let _ = ack.send(false);
                                info!("chat channel lost on write: {}", e);
                                return Exit::Lost;
                            }
                        }
                    }
                    Some(Command::Shutdown) | None => {
                        self.state.set(ChannelState::Closing);
                        if let Err(e) = transport.close().await {
                            debug!("error closing chat channel: {}", e);
                        }
                        return Exit::Shutdown;
                    }
                },
            }
        }
    }

    /// Answer sends with `false` until a shutdown arrives (or the manager is
    /// dropped). Used while the channel is not open.
    async fn refuse_until_shutdown(commands: &mut mpsc::Receiver<Command>) {
        loop {
            match commands.recv().await {
                Some(Command::Send { ack, .. }) => {
                    debug!("channel not open, dropping queued frame");
                    let _ = ack.send(false);
                }
                Some(Command::Shutdown) | None => return,
            }
        }
    }

    /// Decode one inbound frame and hand it to the subscribers. Malformed
    /// frames are logged and dropped.
    fn dispatch(&self, text: &str) {
        let frame = match decode_inbound(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("dropping inbound frame: {}", e);
                return;
            }
        };

        let Ok(subs) = self.subscribers.read() else {
            return;
        };
        match frame {
            InboundFrame::Chat(message) => {
                debug!(sender = %message.sender, "chat message received");
                for callback in &subs.message {
                    callback(&message);
                }
            }
            InboundFrame::Presence(event) => {
                debug!(users = event.users.len(), "roster received");
                for callback in &subs.presence {
                    callback(&event);
                }
            }
        }
    }
}
