//! Error types for address validation, pattern compilation, and dispatch.

/// The error type handlers are allowed to fail with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised when registering an address or compiling a pattern.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The address failed validation (missing leading `/`, whitespace,
    /// unbalanced brackets, or a forbidden character in concrete form).
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress {
        /// The offending address.
        address: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The pattern could not be compiled.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors raised while routing a decoded packet to handlers.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A handler returned an error. Dispatch of the current message stops
    /// and the error propagates unchanged.
    #[error("handler for {address} failed: {source}")]
    Handler {
        /// The address of the message being dispatched.
        address: String,
        /// The handler's error.
        #[source]
        source: HandlerError,
    },
}
