//! The UDP endpoint: client sends and the serve loop.
//!
//! This is the entry point for running an OSC endpoint. It ties together
//! the layers: socket → packet codec → worker pool → dispatcher.
//!
//! The serve loop owns the socket and is the only task that reads from it.
//! Datagrams are handed to whichever worker signals ready first, so slow
//! handlers on one worker never stall the read path while others are idle.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use oscine_proto::Packet;
use oscine_route::{Dispatcher, MatchMode};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::worker::{Incoming, Worker};
use crate::{CancelToken, OscError};

/// Configuration for a [`UdpEndpoint`].
#[derive(Debug, Clone)]
pub struct EndpointOptions {
    /// Size of the socket's OS-level write buffer (`SO_SNDBUF`).
    pub write_buffer_size: usize,
    /// Largest datagram the serve loop will read. Longer datagrams are
    /// truncated by the OS. The default fits a standard Ethernet MTU.
    pub read_mtu: usize,
    /// How registered addresses are compared against incoming ones.
    pub match_mode: MatchMode,
    /// Optional cancellation token. Firing it makes `serve` return
    /// [`OscError::Canceled`].
    pub cancel: Option<CancelToken>,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            write_buffer_size: 64 * 1024,
            read_mtu: 1536,
            match_mode: MatchMode::Pattern,
            cancel: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Serving,
    Closed,
}

/// An OSC connection over UDP.
///
/// One type serves both roles: [`bind`](Self::bind) for a listening server
/// endpoint, [`connect`](Self::connect) for a client with a default peer.
/// Methods take `&self`, so an endpoint shared behind an `Arc` can be
/// closed from a handler while `serve` runs.
pub struct UdpEndpoint {
    socket: UdpSocket,
    options: EndpointOptions,
    state: Mutex<Lifecycle>,
    close_signal: CancelToken,
}

impl UdpEndpoint {
    /// Binds an endpoint to `local`.
    ///
    /// The socket is built with `socket2` so the write buffer can be sized
    /// before binding, then handed to Tokio.
    pub async fn bind(local: SocketAddr, options: EndpointOptions) -> Result<Self, OscError> {
        let socket = configure_socket(local, options.write_buffer_size)?;
        let socket = UdpSocket::from_std(socket)?;
        info!(addr = %socket.local_addr()?, "OSC endpoint bound");
        Ok(Self {
            socket,
            options,
            state: Mutex::new(Lifecycle::Idle),
            close_signal: CancelToken::new(),
        })
    }

    /// Binds to `local` and sets `remote` as the default peer for
    /// [`send`](Self::send).
    pub async fn connect(
        local: SocketAddr,
        remote: SocketAddr,
        options: EndpointOptions,
    ) -> Result<Self, OscError> {
        let endpoint = Self::bind(local, options).await?;
        endpoint.socket.connect(remote).await?;
        debug!(%remote, "OSC endpoint connected");
        Ok(endpoint)
    }

    /// The local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, OscError> {
        Ok(self.socket.local_addr()?)
    }

    /// Sends a packet to the connected peer.
    ///
    /// UDP gives no delivery feedback: sending to a peer that is gone or
    /// no longer serving succeeds here and simply delivers nothing.
    pub async fn send(&self, packet: &Packet) -> Result<(), OscError> {
        self.socket.send(&packet.to_bytes()).await?;
        Ok(())
    }

    /// Sends a packet to an explicit destination.
    pub async fn send_to(&self, packet: &Packet, addr: SocketAddr) -> Result<(), OscError> {
        self.socket.send_to(&packet.to_bytes(), addr).await?;
        Ok(())
    }

    /// Reads datagrams and dispatches them through `dispatcher` on a pool
    /// of `worker_count` workers until the endpoint is closed, the
    /// cancellation token fires, or an unrecoverable error occurs.
    ///
    /// The dispatcher is frozen for the serving lifetime; register every
    /// handler before calling this. Per policy a datagram that fails to
    /// parse, and a handler error, both end serving with that error.
    ///
    /// Datagrams are read in arrival order but dispatched by whichever
    /// worker is free, so messages may be handled out of order across
    /// workers. Pass `worker_count = 1` when per-source ordering matters.
    pub async fn serve(
        &self,
        worker_count: usize,
        dispatcher: Dispatcher,
    ) -> Result<(), OscError> {
        {
            let mut state = self.state.lock().expect("lifecycle lock");
            match *state {
                Lifecycle::Idle => *state = Lifecycle::Serving,
                Lifecycle::Serving => return Err(OscError::AlreadyServing),
                Lifecycle::Closed => return Err(OscError::AlreadyClosed),
            }
        }

        let worker_count = if worker_count == 0 {
            warn!("worker count 0 requested, clamping to 1");
            1
        } else {
            worker_count
        };

        let cancel = self.options.cancel.clone().unwrap_or_default();
        let shutdown = CancelToken::new();
        let dispatcher = Arc::new(dispatcher);

        let (ready_tx, mut ready_rx) = mpsc::channel(worker_count);
        let (error_tx, mut error_rx) = mpsc::channel(worker_count);
        let mut tasks = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let (inbox_tx, inbox) = mpsc::channel(1);
            let worker = Worker {
                id,
                dispatcher: Arc::clone(&dispatcher),
                mode: self.options.match_mode,
                inbox,
                inbox_tx,
                ready: ready_tx.clone(),
                errors: error_tx.clone(),
                shutdown: shutdown.clone(),
            };
            tasks.push(tokio::spawn(worker.run()));
        }
        // The loop below must observe channel closure when every worker
        // exits, so it keeps no senders of its own.
        drop(ready_tx);
        drop(error_tx);

        info!(
            workers = worker_count,
            handlers = dispatcher.len(),
            "OSC endpoint serving"
        );

        let mut buf = vec![0u8; self.options.read_mtu];
        let result = loop {
            // One datagram...
            let (len, sender) = tokio::select! {
                _ = self.close_signal.cancelled() => break Ok(()),
                _ = cancel.cancelled() => break Err(OscError::Canceled),
                Some(err) = error_rx.recv() => break Err(err),
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok(pair) => pair,
                    Err(err) => break Err(OscError::Io(err)),
                },
            };

            // ...to one ready worker.
            let worker = tokio::select! {
                _ = self.close_signal.cancelled() => break Ok(()),
                _ = cancel.cancelled() => break Err(OscError::Canceled),
                Some(err) = error_rx.recv() => break Err(err),
                maybe = ready_rx.recv() => match maybe {
                    Some(worker) => worker,
                    None => break Ok(()),
                },
            };

            // Handing off only fails if the worker just died; its error
            // arrives on the error channel next iteration.
            let incoming = Incoming {
                data: buf[..len].to_vec(),
                sender,
            };
            let _ = worker.send(incoming).await;
        };

        // Stop idle workers and pending bundle waits, then wait for
        // running handlers to finish.
        shutdown.cancel();
        drop(ready_rx);
        for task in tasks {
            let _ = task.await;
        }

        match &result {
            Ok(()) => info!("OSC endpoint stopped"),
            Err(err) => warn!(error = %err, "OSC endpoint stopped with error"),
        }
        result
    }

    /// Signals the serve loop to stop.
    ///
    /// Fails with [`OscError::NotRunning`] if the endpoint never started
    /// serving and [`OscError::AlreadyClosed`] on a second close.
    pub fn close(&self) -> Result<(), OscError> {
        let mut state = self.state.lock().expect("lifecycle lock");
        match *state {
            Lifecycle::Idle => Err(OscError::NotRunning),
            Lifecycle::Serving => {
                *state = Lifecycle::Closed;
                debug!("OSC endpoint close requested");
                self.close_signal.cancel();
                Ok(())
            }
            Lifecycle::Closed => Err(OscError::AlreadyClosed),
        }
    }
}

/// Builds the UDP socket with `socket2` so `SO_SNDBUF` is in place before
/// the bind, then converts it for Tokio.
fn configure_socket(
    local: SocketAddr,
    write_buffer_size: usize,
) -> std::io::Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::for_address(local), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_send_buffer_size(write_buffer_size)?;
    socket.set_nonblocking(true)?;
    socket.bind(&local.into())?;
    Ok(socket.into())
}
