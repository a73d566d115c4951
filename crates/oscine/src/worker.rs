//! Worker tasks: decode one datagram at a time and drive the dispatcher.
//!
//! Each worker owns an inbox. Idle workers park a sender for that inbox on
//! the shared ready channel; the serve loop pops one per datagram. A worker
//! that hits a fatal error reports it on the error channel and exits — the
//! serve loop treats the first reported error as the end of serving.

use std::net::SocketAddr;
use std::sync::Arc;

use oscine_proto::Packet;
use oscine_route::{Dispatcher, MatchMode};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, trace};

use crate::{CancelToken, OscError};

/// One received datagram, as handed from the serve loop to a worker.
#[derive(Debug)]
pub(crate) struct Incoming {
    /// The raw datagram payload.
    pub data: Vec<u8>,
    /// Where it came from.
    pub sender: SocketAddr,
}

/// The state owned by a single worker task.
pub(crate) struct Worker {
    pub id: usize,
    pub dispatcher: Arc<Dispatcher>,
    pub mode: MatchMode,
    /// Receives datagrams handed over by the serve loop.
    pub inbox: mpsc::Receiver<Incoming>,
    /// Cloned onto the ready channel whenever this worker goes idle.
    pub inbox_tx: mpsc::Sender<Incoming>,
    /// Idle-worker registration, popped by the serve loop.
    pub ready: mpsc::Sender<mpsc::Sender<Incoming>>,
    /// Fatal errors travel here; the first one ends `serve`.
    pub errors: mpsc::Sender<OscError>,
    /// Fired when serving ends for any reason. Aborts idle waits and
    /// pending bundle waits; running handlers are never interrupted.
    pub shutdown: CancelToken,
}

impl Worker {
    /// Runs until serving ends or a fatal error occurs.
    pub(crate) async fn run(mut self) {
        trace!(worker = self.id, "worker started");
        loop {
            if self.ready.send(self.inbox_tx.clone()).await.is_err() {
                // Serve loop is gone; nothing left to be ready for.
                break;
            }

            let incoming = tokio::select! {
                maybe = self.inbox.recv() => match maybe {
                    Some(incoming) => incoming,
                    None => break,
                },
                _ = self.shutdown.cancelled() => break,
            };

            if let Err(err) = self.process(incoming).await {
                debug!(worker = self.id, error = %err, "worker reporting fatal error");
                let _ = self.errors.send(err).await;
                break;
            }
        }
        trace!(worker = self.id, "worker stopped");
    }

    /// Decodes and dispatches one datagram.
    async fn process(&self, incoming: Incoming) -> Result<(), OscError> {
        let packet = Packet::decode(&incoming.data, Some(incoming.sender))?;

        // A bundle with a future time-tag is held back until it is due.
        // Cancellation during the wait drops the bundle without running
        // any handler.
        if let Packet::Bundle(bundle) = &packet {
            if let Some(delay) = bundle.time_tag.delay_from_now() {
                trace!(
                    worker = self.id,
                    delay_ms = delay.as_millis() as u64,
                    "holding bundle until its time-tag"
                );
                tokio::select! {
                    _ = time::sleep(delay) => {}
                    _ = self.shutdown.cancelled() => {
                        debug!(worker = self.id, "bundle dropped by shutdown");
                        return Ok(());
                    }
                }
            }
        }

        self.dispatcher.dispatch_packet(&packet, self.mode)?;
        Ok(())
    }
}
