//! The session's background loops: reading, dispatching and writing.
//!
//! A running session has three kinds of task:
//!   1. One read loop: receives frames, answers `ping` inline, and hands
//!      every other envelope to a dispatch task
//!   2. One dispatch task per envelope: feeds the protocol machine under
//!      the session lock and queues the replies
//!   3. One write loop: drains the outbound queue onto the socket
//!
//! Dispatch tasks are chained by a oneshot "baton": each waits for its
//! predecessor to finish before taking the lock, so envelopes reach the
//! machine in arrival order even though the read loop never waits for them.
//!
//! Snapshots are perishable. Each `gameState` is numbered as it is read,
//! and a dispatch task whose snapshot is no longer the newest one read
//! drops it once its turn comes. An agent slower than the broadcast
//! interval therefore answers the latest tick instead of working through
//! a growing backlog of stale ones.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tankwire_protocol::{Codec, Envelope, JsonCodec, Tag};
use tankwire_session::{Agent, ProtocolMachine};
use tankwire_transport::{Connection, TransportError};
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::TankwireError;

pub(crate) type SharedMachine<A> = Arc<Mutex<ProtocolMachine<A>>>;

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

/// Sending half of the bounded outbound queue.
///
/// Sends never wait. A saturated queue drops the message: an action for a
/// tick the server has already moved past is worthless.
#[derive(Clone)]
pub(crate) struct Outbox {
    tx: mpsc::Sender<Vec<u8>>,
    codec: JsonCodec,
}

impl Outbox {
    pub(crate) fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            tx,
            codec: JsonCodec,
        }
    }

    pub(crate) fn send(&self, envelope: &Envelope) -> Result<(), TankwireError> {
        let bytes = self.codec.encode(envelope)?;
        self.tx.try_send(bytes).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TankwireError::QueueFull {
                tag: envelope.tag().clone(),
            },
            mpsc::error::TrySendError::Closed(_) => TankwireError::SessionClosed,
        })
    }
}

// ---------------------------------------------------------------------------
// Read loop
// ---------------------------------------------------------------------------

/// Reads frames until the server closes the connection or the socket fails.
///
/// Returns `Ok(())` on a clean close and the transport error otherwise.
/// Fatal protocol outcomes (a rejection) are reported on `fatal` by the
/// dispatch task that hit them. Before returning, the loop waits for every
/// dispatch it started, so a fatal report always precedes its exit.
pub(crate) async fn read_loop<C, A>(
    conn: Arc<C>,
    outbox: Outbox,
    machine: SharedMachine<A>,
    fatal: mpsc::Sender<TankwireError>,
) -> Result<(), TankwireError>
where
    C: Connection<Error = TransportError>,
    A: Agent,
{
    let conn_id = conn.id();
    let codec = JsonCodec;
    let mut baton: Option<oneshot::Receiver<()>> = None;
    let newest_snapshot = Arc::new(AtomicU64::new(0));

    let result = loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "server closed the connection");
                break Ok(());
            }
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "read failed, ending session");
                break Err(e.into());
            }
        };

        let envelope = match codec.decode(&data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "dropping malformed frame");
                continue;
            }
        };

        match envelope.tag() {
            Tag::Ping => {
                if let Err(e) = outbox.send(&Envelope::pong()) {
                    tracing::warn!(%conn_id, error = %e, "could not queue pong");
                }
                continue;
            }
            Tag::Pong => {
                tracing::debug!(%conn_id, "pong received");
                continue;
            }
            _ => {}
        }

        let snapshot_seq = (*envelope.tag() == Tag::GameState)
            .then(|| newest_snapshot.fetch_add(1, Ordering::SeqCst) + 1);

        let (done_tx, done_rx) = oneshot::channel();
        let previous = baton.replace(done_rx);
        tokio::spawn(dispatch(
            envelope,
            snapshot_seq.map(|seq| (seq, Arc::clone(&newest_snapshot))),
            previous,
            done_tx,
            Arc::clone(&machine),
            outbox.clone(),
            fatal.clone(),
        ));
    };

    if let Some(last) = baton {
        let _ = last.await;
    }
    result
}

/// Runs one envelope through the machine once its predecessor is done.
///
/// `snapshot` carries a `gameState`'s sequence number and the read loop's
/// newest one; a snapshot that has been overtaken is dropped unseen.
async fn dispatch<A: Agent>(
    envelope: Envelope,
    snapshot: Option<(u64, Arc<AtomicU64>)>,
    previous: Option<oneshot::Receiver<()>>,
    done: oneshot::Sender<()>,
    machine: SharedMachine<A>,
    outbox: Outbox,
    fatal: mpsc::Sender<TankwireError>,
) {
    // A dropped sender means the predecessor panicked; carry on regardless.
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    let tag = envelope.tag().clone();
    let superseded = snapshot
        .as_ref()
        .is_some_and(|(seq, newest)| newest.load(Ordering::SeqCst) != *seq);

    if superseded {
        tracing::debug!(%tag, "newer snapshot waiting; stale one dropped");
    } else {
        let mut machine = machine.lock().await;
        match machine.handle(envelope) {
            Ok(replies) => {
                for reply in &replies {
                    if let Err(e) = outbox.send(reply) {
                        tracing::warn!(
                            %tag,
                            reply = %reply.tag(),
                            error = %e,
                            "reply dropped"
                        );
                    }
                }
            }
            Err(e) if e.is_fatal() => {
                tracing::error!(%tag, error = %e, "fatal protocol error");
                let _ = fatal.try_send(e.into());
            }
            Err(e) => {
                tracing::warn!(%tag, error = %e, "message dropped");
            }
        }
    }

    let _ = done.send(());
}

// ---------------------------------------------------------------------------
// Write loop
// ---------------------------------------------------------------------------

/// Writes queued frames until told to stop, then flushes and closes.
///
/// On `stop` the queue is closed to new sends, whatever is already queued
/// is written, and a close frame goes out last.
pub(crate) async fn write_loop<C>(
    conn: Arc<C>,
    mut rx: mpsc::Receiver<Vec<u8>>,
    mut stop: oneshot::Receiver<()>,
) where
    C: Connection<Error = TransportError>,
{
    let conn_id = conn.id();

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            next = rx.recv() => match next {
                Some(bytes) => write_frame(&*conn, &bytes).await,
                None => break,
            },
        }
    }

    rx.close();
    let mut flushed = 0usize;
    while let Some(bytes) = rx.recv().await {
        write_frame(&*conn, &bytes).await;
        flushed += 1;
    }
    if flushed > 0 {
        tracing::debug!(%conn_id, flushed, "flushed queued messages");
    }

    if let Err(e) = conn.close().await {
        tracing::warn!(%conn_id, error = %e, "close frame not sent");
    }
    tracing::debug!(%conn_id, "write loop stopped");
}

async fn write_frame<C>(conn: &C, bytes: &[u8])
where
    C: Connection<Error = TransportError>,
{
    match conn.send(bytes).await {
        Ok(()) => {}
        Err(e @ TransportError::ConnectionClosed(_)) => {
            tracing::debug!(conn_id = %conn.id(), error = %e, "write after close");
        }
        Err(e) => tracing::warn!(conn_id = %conn.id(), error = %e, "write failed"),
    }
}
