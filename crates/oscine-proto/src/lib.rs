//! Packet codec for the Oscine OSC endpoint.
//!
//! Implements the Open Sound Control 1.0 wire format: big-endian scalars,
//! 4-byte-aligned strings and blobs, type-tagged messages, and `#bundle`
//! containers with NTP time-tags.
//!
//! The types here are transport-agnostic — [`Message::to_bytes`] produces a
//! datagram payload and [`Packet::decode`] consumes one, but nothing in this
//! crate touches a socket.

mod bundle;
mod error;
mod message;
mod packet;
mod time;
pub mod wire;

pub use bundle::{Bundle, BUNDLE_TAG};
pub use error::ProtocolError;
pub use message::{Arg, Message};
pub use packet::Packet;
pub use time::TimeTag;
