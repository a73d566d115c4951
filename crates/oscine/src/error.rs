//! Unified error type for the endpoint crate.

use oscine_proto::ProtocolError;
use oscine_route::{DispatchError, RouteError};

/// Top-level error surfaced by [`UdpEndpoint`](crate::UdpEndpoint)
/// operations and on the serve path.
///
/// Codec, routing, and dispatch errors convert in via `#[from]`, so `?`
/// works across the crate boundary.
#[derive(Debug, thiserror::Error)]
pub enum OscError {
    /// A packet failed to encode or decode. Per policy, a parse failure on
    /// the serve path is fatal and ends `serve`.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An address or pattern failed validation or compilation.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// A handler failed while a message was being dispatched.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A socket-level failure.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// `close` was called on an endpoint that never started serving.
    #[error("endpoint is not serving")]
    NotRunning,

    /// `close` was called twice.
    #[error("endpoint already closed")]
    AlreadyClosed,

    /// `serve` was called while the endpoint was already serving.
    #[error("endpoint is already serving")]
    AlreadyServing,

    /// The cancellation token fired while serving.
    #[error("serve canceled")]
    Canceled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_crate_errors_convert_in() {
        let err: OscError = ProtocolError::Unaligned(7).into();
        assert!(matches!(err, OscError::Protocol(_)));
        assert!(err.to_string().contains("not 4-byte aligned"));

        let err: OscError = RouteError::InvalidAddress {
            address: "nope".into(),
            reason: "must begin with '/'".into(),
        }
        .into();
        assert!(matches!(err, OscError::Route(_)));
    }
}
