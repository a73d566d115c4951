//! The dispatcher: a registration-ordered table of pattern → handler.
//!
//! Registration validates and compiles the address once; dispatch walks the
//! table in registration order and invokes every matching handler. Bundles
//! are flattened in declaration order — waiting for a bundle's time-tag is
//! the server's job, so by the time a packet reaches the dispatcher it is
//! due.

use oscine_proto::{Bundle, Message, Packet};
use tracing::{debug, trace};

use crate::{validate_address, DispatchError, HandlerError, MatchMode, Pattern, RouteError};

/// A unit of application logic invoked for each matching message.
///
/// Handlers run on worker tasks and may run concurrently with handlers for
/// other messages; they must be safe to share across threads and must not
/// block the runtime.
pub trait Handler: Send + Sync {
    /// Processes one message. The message is owned for the duration of the
    /// call; its read cursor starts at the first argument.
    fn handle(&self, msg: Message) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(Message) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, msg: Message) -> Result<(), HandlerError> {
        self(msg)
    }
}

struct Entry {
    address: String,
    pattern: Pattern,
    handler: Box<dyn Handler>,
}

/// A table mapping registered address patterns to handlers.
///
/// The table is built before serving starts and is read-only afterwards;
/// the server holds it behind an `Arc` for the serving lifetime.
#[derive(Default)]
pub struct Dispatcher {
    entries: Vec<Entry>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `address`.
    ///
    /// The address is validated and compiled up front, so an invalid
    /// registration fails here rather than at dispatch time. Registering
    /// the same address again replaces the handler in place, keeping its
    /// original position in the dispatch order.
    pub fn register(
        &mut self,
        address: &str,
        handler: impl Handler + 'static,
    ) -> Result<(), RouteError> {
        validate_address(address)?;
        let pattern = Pattern::compile(address)?;
        let handler = Box::new(handler);

        if let Some(entry) = self.entries.iter_mut().find(|e| e.address == address) {
            debug!(address, "replacing existing handler");
            entry.handler = handler;
            return Ok(());
        }

        debug!(address, "registered handler");
        self.entries.push(Entry {
            address: address.to_string(),
            pattern,
            handler,
        });
        Ok(())
    }

    /// Number of registered addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Routes a packet: a message is matched against the table, a bundle is
    /// flattened in declaration order (nested bundles recurse).
    pub fn dispatch_packet(
        &self,
        packet: &Packet,
        mode: MatchMode,
    ) -> Result<(), DispatchError> {
        match packet {
            Packet::Message(msg) => self.dispatch_message(msg, mode),
            Packet::Bundle(bundle) => self.dispatch_bundle(bundle, mode),
        }
    }

    /// Invokes every handler whose registration matches `msg`, in
    /// registration order. Each handler receives its own copy with a rewound
    /// read cursor. The first handler error aborts the rest.
    pub fn dispatch_message(
        &self,
        msg: &Message,
        mode: MatchMode,
    ) -> Result<(), DispatchError> {
        let mut matched = 0usize;
        for entry in &self.entries {
            let hit = match mode {
                MatchMode::Exact => entry.address == msg.address(),
                MatchMode::Pattern => entry.pattern.matches(msg.address()),
            };
            if !hit {
                continue;
            }
            matched += 1;
            trace!(address = msg.address(), registered = %entry.address, "handler invoked");
            entry
                .handler
                .handle(msg.fresh_clone())
                .map_err(|source| DispatchError::Handler {
                    address: msg.address().to_string(),
                    source,
                })?;
        }
        if matched == 0 {
            debug!(address = msg.address(), "no handler matched");
        }
        Ok(())
    }

    fn dispatch_bundle(&self, bundle: &Bundle, mode: MatchMode) -> Result<(), DispatchError> {
        for packet in &bundle.packets {
            self.dispatch_packet(packet, mode)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("addresses", &self.entries.iter().map(|e| &e.address).collect::<Vec<_>>())
            .finish()
    }
}
