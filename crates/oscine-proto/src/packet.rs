//! The packet sum type: a datagram is either a message or a bundle.

use std::net::SocketAddr;

use crate::{Bundle, Message, ProtocolError};

/// One OSC datagram payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// A single message.
    Message(Message),
    /// A bundle of packets scheduled at a time-tag.
    Bundle(Bundle),
}

impl Packet {
    /// Serializes the packet to its wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Packet::Message(msg) => msg.to_bytes(),
            Packet::Bundle(bundle) => bundle.to_bytes(),
        }
    }

    /// Decodes a datagram, dispatching on its first byte: `#` opens a
    /// bundle, anything else is parsed as a message whose address must
    /// begin with `/`.
    pub fn decode(data: &[u8], sender: Option<SocketAddr>) -> Result<Self, ProtocolError> {
        Self::decode_impl(data, sender, true)
    }

    /// Decodes a datagram, accepting any message address.
    pub fn decode_lenient(
        data: &[u8],
        sender: Option<SocketAddr>,
    ) -> Result<Self, ProtocolError> {
        Self::decode_impl(data, sender, false)
    }

    pub(crate) fn decode_impl(
        data: &[u8],
        sender: Option<SocketAddr>,
        strict: bool,
    ) -> Result<Self, ProtocolError> {
        match data.first() {
            None => Err(ProtocolError::Truncated { needed: 4 }),
            Some(b'#') => Ok(Packet::Bundle(Bundle::decode_impl(data, sender, strict)?)),
            Some(_) => Ok(Packet::Message(Message::decode_impl(
                data, sender, strict,
            )?)),
        }
    }
}

impl From<Message> for Packet {
    fn from(msg: Message) -> Self {
        Packet::Message(msg)
    }
}

impl From<Bundle> for Packet {
    fn from(bundle: Bundle) -> Self {
        Packet::Bundle(bundle)
    }
}
