//! # Oscine
//!
//! An Open Sound Control 1.0 endpoint over UDP.
//!
//! Oscine splits the work across three crates: `oscine-proto` implements
//! the binary packet codec, `oscine-route` implements address-pattern
//! matching and dispatch, and this crate drives both from a UDP socket
//! with a bounded worker pool and time-tag-aware bundle delivery.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use oscine::prelude::*;
//!
//! # async fn run() -> Result<(), OscError> {
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register("/mixer/*/gain", |msg: Message| -> Result<(), HandlerError> {
//!     println!("{msg}");
//!     Ok(())
//! })?;
//!
//! let endpoint =
//!     UdpEndpoint::bind("127.0.0.1:9000".parse().unwrap(), EndpointOptions::default())
//!         .await?;
//! endpoint.serve(4, dispatcher).await
//! # }
//! ```

mod cancel;
mod error;
mod udp;
mod worker;

pub use cancel::CancelToken;
pub use error::OscError;
pub use udp::{EndpointOptions, UdpEndpoint};

/// Re-exports everything an endpoint application needs.
///
/// ```rust
/// use oscine::prelude::*;
/// ```
pub mod prelude {
    // Meta-crate
    pub use crate::{CancelToken, EndpointOptions, OscError, UdpEndpoint};

    // Packet codec
    pub use oscine_proto::{Arg, Bundle, Message, Packet, ProtocolError, TimeTag};

    // Routing
    pub use oscine_route::{
        validate_address, validate_concrete, DispatchError, Dispatcher, Handler,
        HandlerError, MatchMode, Pattern, RouteError,
    };
}
