//! `Session` builder and lifecycle.
//!
//! This is the entry point for running a bot. It ties together all the
//! layers: transport → protocol → session machine → agent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tankwire_protocol::{Envelope, LobbyInfo};
use tankwire_session::{Agent, Phase, ProtocolMachine};
use tankwire_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::handler::{read_loop, write_loop, Outbox, SharedMachine};
use crate::TankwireError;

/// Builder for configuring and connecting a [`Session`].
///
/// # Example
///
/// ```rust,ignore
/// use tankwire::prelude::*;
///
/// let session = ClientBuilder::new()
///     .host("127.0.0.1")
///     .port(5000)
///     .nickname("rusty")
///     .connect::<MyBot>()
///     .await?;
/// session.run(async { let _ = tokio::signal::ctrl_c().await; }).await
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config = self.config.with_host(host);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config = self.config.with_port(port);
        self
    }

    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.config = self.config.with_nickname(nickname);
        self
    }

    pub fn join_code(mut self, join_code: impl Into<String>) -> Self {
        self.config = self.config.with_join_code(join_code);
        self
    }

    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.with_outbound_capacity(capacity);
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_shutdown_timeout(timeout);
        self
    }

    /// Dials the server and starts the session's background loops.
    pub async fn connect<A: Agent>(self) -> Result<Session<A>, TankwireError> {
        Session::connect(self.config).await
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One live connection to a game server, driving an agent of type `A`.
///
/// The read and write loops start as soon as the session is connected.
/// Call [`run()`](Self::run) to wait for the game to finish or for a
/// cancellation signal, and to shut down cleanly. Dropping a session
/// without running it aborts both loops.
pub struct Session<A: Agent> {
    conn_id: ConnectionId,
    outbox: Outbox,
    machine: SharedMachine<A>,
    read_task: JoinHandle<Result<(), TankwireError>>,
    write_task: JoinHandle<()>,
    stop_writer: Option<oneshot::Sender<()>>,
    fatal_rx: mpsc::Receiver<TankwireError>,
    shutdown_timeout: Duration,
}

impl<A: Agent> Session<A> {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Validates `config`, dials the server, and spawns the read and
    /// write loops.
    ///
    /// # Errors
    /// - [`TankwireError::InvalidConfig`] before any network activity.
    /// - [`TankwireError::Transport`] when the handshake fails.
    pub async fn connect(config: ClientConfig) -> Result<Self, TankwireError> {
        let config = config.validated()?;
        let endpoint = config.endpoint_url()?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            nickname = %config.nickname,
            "connecting to game server"
        );
        let conn = Arc::new(WebSocketConnection::connect(&endpoint).await?);
        let conn_id = conn.id();
        tracing::info!(%conn_id, "connected");

        let (tx, rx) = mpsc::channel(config.outbound_capacity);
        let (stop_tx, stop_rx) = oneshot::channel();
        let (fatal_tx, fatal_rx) = mpsc::channel(1);
        let outbox = Outbox::new(tx);
        let machine: SharedMachine<A> = Arc::new(Mutex::new(ProtocolMachine::new()));

        let write_task = tokio::spawn(write_loop(Arc::clone(&conn), rx, stop_rx));
        let read_task = tokio::spawn(read_loop(
            conn,
            outbox.clone(),
            Arc::clone(&machine),
            fatal_tx,
        ));

        Ok(Self {
            conn_id,
            outbox,
            machine,
            read_task,
            write_task,
            stop_writer: Some(stop_tx),
            fatal_rx,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Identifier of the underlying connection, as it appears in logs.
    pub fn id(&self) -> ConnectionId {
        self.conn_id
    }

    /// Queues an envelope for the write loop without waiting.
    ///
    /// # Errors
    /// - [`TankwireError::QueueFull`] when the outbound queue is saturated;
    ///   the envelope is dropped and the session carries on.
    /// - [`TankwireError::SessionClosed`] once shutdown has begun.
    pub fn send(&self, envelope: &Envelope) -> Result<(), TankwireError> {
        self.outbox.send(envelope).inspect_err(|e| {
            if matches!(e, TankwireError::QueueFull { .. }) {
                tracing::warn!(conn_id = %self.conn_id, error = %e, "send dropped");
            }
        })
    }

    /// The connection's current phase.
    pub async fn phase(&self) -> Phase {
        self.machine.lock().await.phase()
    }

    /// The lobby as last announced by the server, if any.
    pub async fn lobby(&self) -> Option<LobbyInfo> {
        self.machine.lock().await.lobby().cloned()
    }

    /// Runs until `shutdown` resolves, the server closes the connection,
    /// or a fatal error occurs; then shuts the session down.
    ///
    /// Shutdown order: the outbound queue stops accepting sends, messages
    /// already queued are written, a close frame is sent, and the read
    /// loop is given `shutdown_timeout` to see the server's close before
    /// it is aborted.
    ///
    /// Returns `Ok(())` for a cancellation or a clean server close, and the
    /// fatal error (rejection, socket failure) otherwise.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), TankwireError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let conn_id = self.conn_id;
        let mut read_finished = false;

        let mut outcome = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(%conn_id, "cancellation requested");
                Ok(())
            }
            joined = &mut self.read_task => {
                read_finished = true;
                joined.map_err(TankwireError::from).and_then(|r| r)
            }
            Some(err) = self.fatal_rx.recv() => Err(err),
        };

        // --- Step 1: flush the queue and send the close frame ---
        if let Some(stop) = self.stop_writer.take() {
            let _ = stop.send(());
        }
        match tokio::time::timeout(self.shutdown_timeout, &mut self.write_task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(%conn_id, error = %e, "write loop failed"),
            Err(_) => {
                tracing::warn!(%conn_id, "write loop did not stop in time, aborting");
                self.write_task.abort();
            }
        }

        // --- Step 2: wait for the read loop to see the close ---
        if !read_finished {
            match tokio::time::timeout(self.shutdown_timeout, &mut self.read_task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => {
                    tracing::debug!(%conn_id, error = %e, "read loop ended with error during shutdown");
                }
                Ok(Err(e)) => tracing::warn!(%conn_id, error = %e, "read loop failed"),
                Err(_) => {
                    tracing::warn!(%conn_id, "read loop did not stop in time, aborting");
                    self.read_task.abort();
                }
            }
        }

        // --- Step 3: nothing is processed after this point ---
        self.machine.lock().await.close();
        if outcome.is_ok() {
            if let Ok(err) = self.fatal_rx.try_recv() {
                outcome = Err(err);
            }
        }
        match &outcome {
            Ok(()) => tracing::info!(%conn_id, "session closed"),
            Err(e) => tracing::error!(%conn_id, error = %e, "session closed with error"),
        }
        outcome
    }
}

impl<A: Agent> Drop for Session<A> {
    fn drop(&mut self) {
        self.read_task.abort();
        self.write_task.abort();
    }
}
