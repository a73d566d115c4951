//! OSC bundles: a time-tag and a sequence of nested packets.
//!
//! Wire form: the 8-byte literal `#bundle\0`, an 8-byte time-tag, then zero
//! or more elements, each prefixed by a big-endian `i32` size.

use std::net::SocketAddr;

use crate::wire::{WireReader, WireWriter};
use crate::{Packet, ProtocolError, TimeTag};

/// The literal that opens every bundle on the wire, including the NUL.
pub const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// A container scheduling nested packets for delivery at its time-tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// When the contained packets should be delivered. `TimeTag::IMMEDIATE`
    /// means as soon as the bundle arrives.
    pub time_tag: TimeTag,
    /// The contained packets, dispatched in declaration order.
    pub packets: Vec<Packet>,
}

impl Bundle {
    /// Creates an empty bundle scheduled at `time_tag`.
    pub fn new(time_tag: TimeTag) -> Self {
        Self {
            time_tag,
            packets: Vec::new(),
        }
    }

    /// Appends a packet to the bundle.
    pub fn push(&mut self, packet: impl Into<Packet>) -> &mut Self {
        self.packets.push(packet.into());
        self
    }

    /// Serializes the bundle: prefix, time-tag, then each child's size and
    /// bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        w.put_raw(BUNDLE_TAG);
        w.put_time_tag(self.time_tag);
        for packet in &self.packets {
            let child = packet.to_bytes();
            w.put_i32(child.len() as i32);
            w.put_raw(&child);
        }
        w.into_bytes()
    }

    /// Decodes a bundle, requiring message addresses to begin with `/`.
    pub fn decode(data: &[u8], sender: Option<SocketAddr>) -> Result<Self, ProtocolError> {
        Self::decode_impl(data, sender, true)
    }

    /// Decodes a bundle, accepting any message address.
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
        if data.len() % 4 != 0 {
            return Err(ProtocolError::Unaligned(data.len()));
        }
        if data.len() < BUNDLE_TAG.len() || &data[..BUNDLE_TAG.len()] != BUNDLE_TAG {
            return Err(ProtocolError::InvalidBundle(
                "missing #bundle prefix".into(),
            ));
        }

        let mut r = WireReader::new(&data[BUNDLE_TAG.len()..]);
        let time_tag = r.read_time_tag()?;

        let mut packets = Vec::new();
        while !r.is_empty() {
            let size = r.read_i32()?;
            if size < 0 {
                return Err(ProtocolError::InvalidBundle(format!(
                    "negative element size {size}"
                )));
            }
            let size = size as usize;
            if size > r.remaining() {
                return Err(ProtocolError::InvalidBundle(format!(
                    "element size {size} overruns bundle ({} bytes left)",
                    r.remaining()
                )));
            }
            let child = r.take(size)?;
            packets.push(Packet::decode_impl(child, sender, strict)?);
        }

        Ok(Self { time_tag, packets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;

    fn message(addr: &str, v: i32) -> Message {
        let mut msg = Message::new(addr);
        msg.write_i32(v);
        msg
    }

    #[test]
    fn round_trip_with_two_messages() {
        let mut bundle = Bundle::new(TimeTag::IMMEDIATE);
        bundle.push(message("/a", 1)).push(message("/b", 2));

        let bytes = bundle.to_bytes();
        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(&bytes[..8], BUNDLE_TAG);

        let decoded = Bundle::decode(&bytes, None).unwrap();
        assert_eq!(decoded, bundle);
    }

    #[test]
    fn round_trip_with_nested_bundle() {
        let mut inner = Bundle::new(TimeTag {
            seconds: 3_800_000_000,
            fraction: 9,
        });
        inner.push(message("/inner", 3));

        let mut outer = Bundle::new(TimeTag::IMMEDIATE);
        outer.push(message("/outer", 4)).push(inner);

        let bytes = outer.to_bytes();
        let decoded = Bundle::decode(&bytes, None).unwrap();
        assert_eq!(decoded, outer);
        assert!(matches!(decoded.packets[1], Packet::Bundle(_)));
    }

    #[test]
    fn empty_bundle_is_sixteen_bytes() {
        let bundle = Bundle::new(TimeTag::IMMEDIATE);
        let bytes = bundle.to_bytes();
        assert_eq!(bytes.len(), 16);
        let decoded = Bundle::decode(&bytes, None).unwrap();
        assert!(decoded.packets.is_empty());
    }

    #[test]
    fn bad_prefix_is_rejected() {
        let mut bytes = Bundle::new(TimeTag::IMMEDIATE).to_bytes();
        bytes[1] = b'!';
        assert!(matches!(
            Bundle::decode(&bytes, None),
            Err(ProtocolError::InvalidBundle(_))
        ));
    }

    #[test]
    fn overlong_element_size_is_rejected() {
        let mut bundle = Bundle::new(TimeTag::IMMEDIATE);
        bundle.push(message("/a", 1));
        let mut bytes = bundle.to_bytes();
        // Inflate the element's declared size past the end of the buffer.
        bytes[16..20].copy_from_slice(&1000i32.to_be_bytes());
        assert!(matches!(
            Bundle::decode(&bytes, None),
            Err(ProtocolError::InvalidBundle(_))
        ));
    }
}
