//! Channel session state machine.
//!
//! Each session owns one tokio task that runs the whole lifecycle as a
//! single loop: connect, pump frames while open, back off, reconnect. The
//! shutdown signal is always polled first, so a disconnect wins over a
//! pending reconnect or an inbound frame that is ready at the same time.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::auth::SharedCredentials;
use crate::config::ChannelSettings;

use super::messages::ClientMessage;
use super::policy::ReconnectPolicy;
use super::transport::{channel_url, Connector, Inbound, Transport, WsConnector};
use super::{ChannelError, ChannelHandler, ChannelState, CloseReason};

/// One logical push connection with its retry state.
///
/// `connect` spawns the session task and must be called inside a tokio
/// runtime. Dropping the session stops the task.
pub struct ChannelSession<C: Connector = WsConnector> {
    endpoint: String,
    base_url: Url,
    settings: ChannelSettings,
    credentials: SharedCredentials,
    connector: Arc<C>,
    handler: Arc<dyn ChannelHandler>,
    state_tx: Arc<watch::Sender<ChannelState>>,
    state_rx: watch::Receiver<ChannelState>,
    shutdown_tx: watch::Sender<bool>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

impl ChannelSession<WsConnector> {
    /// WebSocket session sharing the request client's address and credential
    pub fn websocket(
        api: &ApiClient,
        endpoint: impl Into<String>,
        settings: ChannelSettings,
        handler: impl ChannelHandler,
    ) -> Self {
        Self::new(
            endpoint,
            api.base_url().clone(),
            settings,
            api.credentials().clone(),
            WsConnector,
            handler,
        )
    }
}

impl<C: Connector> ChannelSession<C> {
    pub fn new(
        endpoint: impl Into<String>,
        base_url: Url,
        settings: ChannelSettings,
        credentials: SharedCredentials,
        connector: C,
        handler: impl ChannelHandler,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ChannelState::Idle);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            endpoint: endpoint.into(),
            base_url,
            settings,
            credentials,
            connector: Arc::new(connector),
            handler: Arc::new(handler),
            state_tx: Arc::new(state_tx),
            state_rx,
            shutdown_tx,
            outbound: None,
            task: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes every state transition
    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Start the session.
    ///
    /// Fails without any connection attempt when no credential is stored;
    /// the error is also passed to the handler. The outcome of the attempt
    /// itself is reported through the handler and the state receiver.
    ///
    /// Calling this while a session task is running does nothing. After
    /// `ClosedGaveUp` it starts over with a fresh attempt budget.
    pub fn connect(&mut self) -> Result<(), ChannelError> {
        match self.state() {
            ChannelState::Idle | ChannelState::ClosedGaveUp => {}
            ChannelState::Disconnected => {
                let err = ChannelError::Terminated;
                self.handler.on_error(&err);
                return Err(err);
            }
            state => {
                debug!(endpoint = %self.endpoint, %state, "Channel already running");
                return Ok(());
            }
        }

        // Validate up front so a missing credential never reaches the connector
        if let Err(err) = resolve_url(&self.credentials, &self.base_url, &self.endpoint) {
            warn!(endpoint = %self.endpoint, error = %err, "Cannot start channel");
            self.handler.on_error(&err);
            return Err(err);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        self.shutdown_tx = shutdown_tx;
        self.outbound = Some(outbound_tx);

        publish(&self.state_tx, self.handler.as_ref(), ChannelState::Connecting);

        let worker = Worker {
            endpoint: self.endpoint.clone(),
            base_url: self.base_url.clone(),
            credentials: self.credentials.clone(),
            connector: self.connector.clone(),
            handler: self.handler.clone(),
            policy: ReconnectPolicy::from(&self.settings),
            heartbeat: self.settings.heartbeat_interval,
            state_tx: self.state_tx.clone(),
            shutdown: shutdown_rx,
            outbound: outbound_rx,
        };
        self.task = Some(tokio::spawn(worker.run()));
        Ok(())
    }

    /// Send a JSON value. Only permitted while `Open`; otherwise the
    /// message is dropped and `NotConnected` returned.
    pub fn send(&self, message: &Value) -> Result<(), ChannelError> {
        let outbound = match (&self.outbound, self.state()) {
            (Some(outbound), ChannelState::Open) => outbound,
            (_, state) => {
                warn!(endpoint = %self.endpoint, %state, "Dropping message, channel not open");
                return Err(ChannelError::NotConnected);
            }
        };
        outbound
            .send(message.to_string())
            .map_err(|_| ChannelError::NotConnected)
    }

    pub fn send_message(&self, message: &ClientMessage) -> Result<(), ChannelError> {
        self.send(&message.to_value())
    }

    /// Close the connection and stop for good. Suppresses any reconnect
    /// that is already scheduled.
    pub async fn disconnect(&mut self) {
        self.shutdown_tx.send_replace(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(endpoint = %self.endpoint, error = %e, "Channel task ended abnormally");
            }
        }
        self.outbound = None;
        publish(&self.state_tx, self.handler.as_ref(), ChannelState::Disconnected);
        info!(endpoint = %self.endpoint, "Channel disconnected");
    }
}

impl<C: Connector> Drop for ChannelSession<C> {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// Publish a transition; the handler only hears about actual changes.
fn publish(state_tx: &watch::Sender<ChannelState>, handler: &dyn ChannelHandler, state: ChannelState) {
    let previous = state_tx.send_replace(state);
    if previous != state {
        debug!(from = %previous, to = %state, "Channel state");
        handler.on_state_change(state);
    }
}

/// Channel address with the current credential.
fn resolve_url(
    credentials: &SharedCredentials,
    base_url: &Url,
    endpoint: &str,
) -> Result<Url, ChannelError> {
    let credential = credentials
        .load()?
        .ok_or(ChannelError::MissingCredential)?;
    channel_url(base_url, endpoint, credential.as_str())
}

/// Resolves once shutdown was requested or the session is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn heartbeat_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Why a period in `Open` ended.
enum OpenExit {
    Shutdown,
    Closed(CloseReason),
    Failed(ChannelError),
}

enum Step {
    Shutdown,
    Frame(Option<Result<Inbound, ChannelError>>),
    Outbound(String),
    Heartbeat,
}

struct Worker<C: Connector> {
    endpoint: String,
    base_url: Url,
    credentials: SharedCredentials,
    connector: Arc<C>,
    handler: Arc<dyn ChannelHandler>,
    policy: ReconnectPolicy,
    heartbeat: Option<Duration>,
    state_tx: Arc<watch::Sender<ChannelState>>,
    shutdown: watch::Receiver<bool>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl<C: Connector> Worker<C> {
    fn set_state(&self, state: ChannelState) {
        publish(&self.state_tx, self.handler.as_ref(), state);
    }

    async fn run(mut self) {
        // Reconnects since the last successful open
        let mut attempts: u32 = 0;

        loop {
            self.set_state(ChannelState::Connecting);

            let url = match resolve_url(&self.credentials, &self.base_url, &self.endpoint) {
                Ok(url) => Some(url),
                Err(ChannelError::MissingCredential) => {
                    warn!(endpoint = %self.endpoint, "Credential gone, not reconnecting");
                    self.handler.on_error(&ChannelError::MissingCredential);
                    self.give_up(attempts);
                    return;
                }
                Err(err) => {
                    self.handler.on_error(&err);
                    None
                }
            };

            if let Some(url) = url {
                let connected = tokio::select! {
                    biased;
                    _ = shutdown_requested(&mut self.shutdown) => None,
                    result = self.connector.connect(&url) => Some(result),
                };

                match connected {
                    None => return self.finish(),
                    Some(Ok(mut transport)) => {
                        attempts = 0;
                        info!(endpoint = %self.endpoint, "Channel open");
                        self.set_state(ChannelState::Open);
                        self.handler.on_open();

                        match self.pump(&mut transport).await {
                            OpenExit::Shutdown => {
                                transport.close().await;
                                return self.finish();
                            }
                            OpenExit::Closed(reason) => {
                                warn!(endpoint = %self.endpoint, %reason, "Channel closed");
                                self.handler.on_close(&reason);
                                if reason.is_abnormal() {
                                    self.handler.on_error(&ChannelError::Closed(reason));
                                }
                            }
                            OpenExit::Failed(err) => {
                                warn!(endpoint = %self.endpoint, error = %err, "Channel failed");
                                self.handler.on_error(&err);
                            }
                        }
                    }
                    Some(Err(err)) => {
                        warn!(endpoint = %self.endpoint, error = %err, "Connection attempt failed");
                        self.handler.on_error(&err);
                    }
                }
            }

            let Some((attempt, delay)) = self.policy.next_attempt(attempts) else {
                self.give_up(attempts);
                return;
            };
            attempts = attempt;
            info!(
                endpoint = %self.endpoint,
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting"
            );
            self.set_state(ChannelState::ClosedRetrying { attempt, delay });

            if !self.backoff(delay).await {
                return self.finish();
            }
        }
    }

    /// Dispatch frames until the connection ends or shutdown is requested.
    async fn pump(&mut self, transport: &mut C::Transport) -> OpenExit {
        let mut heartbeat = self.heartbeat.map(|period| {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            let step = tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown) => Step::Shutdown,
                frame = transport.next_frame() => Step::Frame(frame),
                Some(text) = self.outbound.recv() => Step::Outbound(text),
                _ = heartbeat_tick(&mut heartbeat) => Step::Heartbeat,
            };

            match step {
                Step::Shutdown => return OpenExit::Shutdown,
                Step::Frame(None) => {
                    return OpenExit::Closed(CloseReason {
                        code: None,
                        reason: "stream ended".to_string(),
                    })
                }
                Step::Frame(Some(Ok(Inbound::Closed(reason)))) => return OpenExit::Closed(reason),
                Step::Frame(Some(Err(err))) => return OpenExit::Failed(err),
                Step::Frame(Some(Ok(Inbound::Text(text)))) => self.dispatch(&text),
                Step::Outbound(text) => {
                    if let Err(err) = transport.send_text(text).await {
                        return OpenExit::Failed(err);
                    }
                }
                Step::Heartbeat => {
                    if let Err(err) = transport.send_text(ClientMessage::Ping.to_value().to_string()).await {
                        return OpenExit::Failed(err);
                    }
                }
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<Value>(text) {
            Ok(message) => {
                debug!(endpoint = %self.endpoint, bytes = text.len(), "Channel message");
                self.handler.on_message(message);
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Dropping unparsable message");
            }
        }
    }

    /// Wait out the backoff delay. Returns false if shutdown came first.
    async fn backoff(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut self.shutdown) => return false,
                _ = &mut sleep => return true,
                Some(_) = self.outbound.recv() => {
                    warn!(endpoint = %self.endpoint, "Dropping message queued while reconnecting");
                }
            }
        }
    }

    fn give_up(&self, attempts: u32) {
        warn!(endpoint = %self.endpoint, attempts, "Giving up on channel");
        self.set_state(ChannelState::ClosedGaveUp);
        self.handler.on_give_up(attempts);
    }

    fn finish(&self) {
        self.set_state(ChannelState::Disconnected);
    }
}
