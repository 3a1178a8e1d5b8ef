//! Client side of the realtime link.
//!
//! One driver task owns the connection state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!       ^             |            |
//!       +--- retry ---+--- drop ---+
//!       |
//!       +--> Simulating (once max_attempts retries have failed)
//! ```
//!
//! Simulating is left only through [`TransportHandle::reconnect`].

use std::{fmt, time::Duration};
use tinyrand::{Rand, Seeded, StdRand};
use tinyrand_std::thread_rand;
use tokio::{
    sync::{mpsc, watch},
    time::{Instant, interval_at, sleep},
};
use tracing::{debug, info, warn};

use super::{
    connector::{Connector, Link},
    router::{DashboardSink, EventRouter},
    simulation,
};
use crate::{
    models::{ClientMessage, ServerEvent},
    state::AttackMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Disconnected,
    Connecting,
    Connected,
    Simulating,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Simulating => "simulating",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl ReconnectPolicy {
    /// Linear backoff: `base_delay × attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Retry(Duration),
    Simulate,
}

/// Consecutive failures since the last successful connect. The first failure
/// is followed by up to `max_attempts` delayed retries before simulation.
#[derive(Debug, Clone, Default)]
pub struct RetryTracker {
    attempts: u32,
}

impl RetryTracker {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn on_connected(&mut self) {
        self.attempts = 0;
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn on_failure(&mut self, policy: &ReconnectPolicy) -> NextStep {
        self.attempts += 1;
        if self.attempts <= policy.max_attempts {
            NextStep::Retry(policy.delay_for(self.attempts))
        } else {
            NextStep::Simulate
        }
    }
}

#[derive(Debug)]
enum Command {
    Send(ClientMessage),
    SetAttackMode(bool),
    Reconnect,
    Disconnect,
}

/// Control surface of a running [`ClientTransport`]. Cheap to clone.
#[derive(Clone)]
pub struct TransportHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<TransportState>,
    mode: AttackMode,
}

impl TransportHandle {
    /// Queues `message` for the server. Dropped by the driver unless connected.
    /// Returns `false` once the driver has stopped.
    pub fn send(&self, message: ClientMessage) -> bool {
        self.commands.send(Command::Send(message)).is_ok()
    }

    /// Updates the local mode right away, then asks the server to follow.
    pub fn set_attack_mode(&self, enabled: bool) -> bool {
        self.mode.set(enabled);
        self.commands.send(Command::SetAttackMode(enabled)).is_ok()
    }

    /// Forgets past failures and connects again, leaving simulation if needed.
    pub fn reconnect(&self) -> bool {
        self.commands.send(Command::Reconnect).is_ok()
    }

    pub fn disconnect(&self) -> bool {
        self.commands.send(Command::Disconnect).is_ok()
    }

    pub fn state(&self) -> TransportState {
        *self.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<TransportState> {
        self.state.clone()
    }

    pub fn attack_mode(&self) -> bool {
        self.mode.is_enabled()
    }
}

enum Exit {
    LinkLost,
    TimerElapsed,
    Reconnect,
    Shutdown,
}

enum LinkStep {
    Frame(Option<String>),
    Command(Option<Command>),
}

enum SimStep {
    Attack,
    Stats,
    Command(Option<Command>),
}

pub struct ClientTransport<C, S> {
    connector: C,
    endpoint: String,
    policy: ReconnectPolicy,
    retries: RetryTracker,
    router: EventRouter<S>,
    mode: AttackMode,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<TransportState>,
    rng: StdRand,
}

impl<C: Connector, S: DashboardSink> ClientTransport<C, S> {
    pub fn new(
        connector: C,
        endpoint: impl Into<String>,
        policy: ReconnectPolicy,
        sink: S,
    ) -> (Self, TransportHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(TransportState::Disconnected);
        let mode = AttackMode::new(false);

        let transport = Self {
            connector,
            endpoint: endpoint.into(),
            policy,
            retries: RetryTracker::default(),
            router: EventRouter::new(sink),
            mode: mode.clone(),
            commands: command_rx,
            state: state_tx,
            rng: StdRand::seed(thread_rand().next_u64()),
        };
        let handle = TransportHandle {
            commands: command_tx,
            state: state_rx,
            mode,
        };
        (transport, handle)
    }

    /// Drives the state machine until disconnected; returns the sink.
    pub async fn run(mut self) -> S {
        loop {
            let exit = self.attempt().await;

            let exit = match exit {
                Exit::LinkLost => {
                    self.set_state(TransportState::Disconnected);
                    match self.retries.on_failure(&self.policy) {
                        NextStep::Retry(delay) => {
                            info!(
                                attempt = self.retries.attempts(),
                                max = self.policy.max_attempts,
                                delay_ms = delay.as_millis() as u64,
                                "Reconnecting"
                            );
                            self.wait(delay).await
                        }
                        NextStep::Simulate => {
                            let attempts = self.retries.attempts();
                            info!(attempts, "Server unreachable, switching to simulation");
                            self.simulate().await
                        }
                    }
                }
                other => other,
            };

            match exit {
                Exit::Shutdown => break,
                Exit::Reconnect => self.retries.reset(),
                Exit::LinkLost | Exit::TimerElapsed => {}
            }
        }

        self.set_state(TransportState::Disconnected);
        info!("Transport stopped");
        self.router.into_sink()
    }

    fn set_state(&self, state: TransportState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Transport state changed");
        }
    }

    /// One connect attempt and, if it succeeds, the life of that link.
    async fn attempt(&mut self) -> Exit {
        self.set_state(TransportState::Connecting);

        let opened = {
            let connect = self.connector.connect(&self.endpoint);
            tokio::pin!(connect);
            loop {
                tokio::select! {
                    result = &mut connect => break result,
                    command = self.commands.recv() => {
                        match Self::offline_command(&mut self.router, command) {
                            Some(Exit::Reconnect) => {
                                self.retries.reset();
                                debug!("Already connecting");
                            }
                            Some(exit) => return exit,
                            None => {}
                        }
                    }
                }
            }
        };

        match opened {
            Ok(link) => {
                self.retries.on_connected();
                self.set_state(TransportState::Connected);
                info!(endpoint = %self.endpoint, "Connected");
                self.drive_link(link).await
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Connect failed");
                Exit::LinkLost
            }
        }
    }

    async fn drive_link(&mut self, mut link: Link) -> Exit {
        send_on(&link, &ClientMessage::client_connected()).await;

        loop {
            let step = tokio::select! {
                frame = link.inbound.recv() => LinkStep::Frame(frame),
                command = self.commands.recv() => LinkStep::Command(command),
            };

            match step {
                LinkStep::Frame(Some(text)) => self.handle_frame(&link, &text).await,
                LinkStep::Frame(None) => {
                    info!("Connection lost");
                    return Exit::LinkLost;
                }
                LinkStep::Command(Some(Command::Send(message))) => send_on(&link, &message).await,
                LinkStep::Command(Some(Command::SetAttackMode(enabled))) => {
                    send_on(&link, &ClientMessage::AttackMode { enabled }).await;
                }
                LinkStep::Command(Some(Command::Reconnect)) => return Exit::Reconnect,
                LinkStep::Command(Some(Command::Disconnect) | None) => return Exit::Shutdown,
            }
        }
    }

    async fn handle_frame(&mut self, link: &Link, text: &str) {
        let event = match ServerEvent::from_frame(text) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Dropping malformed frame");
                return;
            }
        };

        match &event {
            ServerEvent::Ping { .. } => {
                send_on(link, &ClientMessage::pong()).await;
                return;
            }
            ServerEvent::AttackModeChanged { enabled } => {
                self.mode.set(*enabled);
            }
            _ => {}
        }

        self.router.route(&event);
    }

    /// Sleeps out a backoff delay while still answering commands.
    async fn wait(&mut self, delay: Duration) -> Exit {
        let timer = sleep(delay);
        tokio::pin!(timer);

        loop {
            let command = tokio::select! {
                _ = &mut timer => return Exit::TimerElapsed,
                command = self.commands.recv() => command,
            };
            if let Some(exit) = Self::offline_command(&mut self.router, command) {
                return exit;
            }
        }
    }

    async fn simulate(&mut self) -> Exit {
        self.set_state(TransportState::Simulating);

        let start = Instant::now();
        let attack_every = simulation::SIMULATED_ATTACK_INTERVAL;
        let stats_every = simulation::SIMULATED_STATS_INTERVAL;
        let mut attacks = interval_at(start + attack_every, attack_every);
        let mut stats = interval_at(start + stats_every, stats_every);

        loop {
            let step = tokio::select! {
                _ = attacks.tick() => SimStep::Attack,
                _ = stats.tick() => SimStep::Stats,
                command = self.commands.recv() => SimStep::Command(command),
            };

            match step {
                SimStep::Attack => {
                    let attack_mode = self.mode.is_enabled();
                    if let Some(event) = simulation::attack_event(&mut self.rng, attack_mode) {
                        self.router.route(&event);
                    }
                }
                SimStep::Stats => {
                    let event = simulation::stats_event(&mut self.rng, self.mode.is_enabled());
                    self.router.route(&event);
                }
                SimStep::Command(command) => {
                    if let Some(exit) = Self::offline_command(&mut self.router, command) {
                        return exit;
                    }
                }
            }
        }
    }

    /// Handles a command with no live link. Returns the exit it triggers, if any.
    /// Attack-mode toggles still reach the sink so the dashboard follows them.
    fn offline_command(router: &mut EventRouter<S>, command: Option<Command>) -> Option<Exit> {
        match command {
            Some(Command::Send(message)) => {
                debug!(message = ?message, "Not connected, message dropped");
                None
            }
            Some(Command::SetAttackMode(enabled)) => {
                router.route(&ServerEvent::AttackModeChanged { enabled });
                None
            }
            Some(Command::Reconnect) => Some(Exit::Reconnect),
            Some(Command::Disconnect) | None => Some(Exit::Shutdown),
        }
    }
}

async fn send_on(link: &Link, message: &ClientMessage) {
    match message.to_frame() {
        Ok(frame) => {
            if link.outbound.send(frame).await.is_err() {
                debug!("Link closed before send");
            }
        }
        Err(e) => warn!(error = %e, "Failed to encode message"),
    }
}
