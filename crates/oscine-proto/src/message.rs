//! OSC messages: an address, a type tag string, and typed arguments.
//!
//! A message is built with the typed `write_*` methods and serialized with
//! [`Message::to_bytes`], or produced by [`Message::decode`] from a received
//! datagram and consumed with the typed `read_*` methods. Reads advance a
//! cursor over the arguments; a read against the wrong tag fails with
//! [`ProtocolError::TypeMismatch`] and leaves the cursor where it was.

use std::fmt;
use std::net::SocketAddr;

use crate::wire::{WireReader, WireWriter};
use crate::{ProtocolError, TimeTag};

/// The type tag character for each argument kind.
pub(crate) mod tag {
    pub const INT: char = 'i';
    pub const FLOAT: char = 'f';
    pub const STRING: char = 's';
    pub const BLOB: char = 'b';
    pub const TRUE: char = 'T';
    pub const FALSE: char = 'F';
    pub const NIL: char = 'N';
    pub const IMPULSE: char = 'I';
    pub const TIME: char = 't';
}

/// One decoded OSC argument.
///
/// `Bool`, `Nil`, and `Impulse` are carried entirely in the type tag and
/// occupy zero payload bytes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// 32-bit signed integer (`i`).
    Int(i32),
    /// 32-bit IEEE-754 float (`f`).
    Float(f32),
    /// UTF-8 string (`s`).
    Str(String),
    /// Binary blob (`b`). May be empty.
    Blob(Vec<u8>),
    /// Boolean (`T` / `F`).
    Bool(bool),
    /// Nil (`N`).
    Nil,
    /// Impulse, also known as infinitum (`I`).
    Impulse,
    /// 64-bit NTP time-tag (`t`).
    Time(TimeTag),
}

impl Arg {
    /// The type tag character describing this argument.
    pub fn tag(&self) -> char {
        match self {
            Arg::Int(_) => tag::INT,
            Arg::Float(_) => tag::FLOAT,
            Arg::Str(_) => tag::STRING,
            Arg::Blob(_) => tag::BLOB,
            Arg::Bool(true) => tag::TRUE,
            Arg::Bool(false) => tag::FALSE,
            Arg::Nil => tag::NIL,
            Arg::Impulse => tag::IMPULSE,
            Arg::Time(_) => tag::TIME,
        }
    }

    fn encode(&self, w: &mut WireWriter) {
        match self {
            Arg::Int(v) => w.put_i32(*v),
            Arg::Float(v) => w.put_f32(*v),
            Arg::Str(v) => w.put_str(v),
            Arg::Blob(v) => w.put_blob(v),
            Arg::Time(v) => w.put_time_tag(*v),
            // Tag-only arguments have no payload.
            Arg::Bool(_) | Arg::Nil | Arg::Impulse => {}
        }
    }

    fn decode(tag_char: char, r: &mut WireReader<'_>) -> Result<Self, ProtocolError> {
        match tag_char {
            tag::INT => Ok(Arg::Int(r.read_i32()?)),
            tag::FLOAT => Ok(Arg::Float(r.read_f32()?)),
            tag::STRING => Ok(Arg::Str(r.read_str()?)),
            tag::BLOB => Ok(Arg::Blob(r.read_blob()?)),
            tag::TRUE => Ok(Arg::Bool(true)),
            tag::FALSE => Ok(Arg::Bool(false)),
            tag::NIL => Ok(Arg::Nil),
            tag::IMPULSE => Ok(Arg::Impulse),
            tag::TIME => Ok(Arg::Time(r.read_time_tag()?)),
            other => Err(ProtocolError::InvalidTypeTag(other)),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{v}"),
            Arg::Float(v) => write!(f, "{v}"),
            Arg::Str(v) => write!(f, "{v:?}"),
            Arg::Blob(v) => write!(f, "blob[{}]", v.len()),
            Arg::Bool(v) => write!(f, "{v}"),
            Arg::Nil => write!(f, "nil"),
            Arg::Impulse => write!(f, "impulse"),
            Arg::Time(v) => write!(f, "{v}"),
        }
    }
}

/// An OSC message.
///
/// Equality compares the address and arguments — not the read cursor and not
/// the sender, so a decoded message compares equal to the one that produced
/// its bytes.
#[derive(Debug, Clone)]
pub struct Message {
    address: String,
    args: Vec<Arg>,
    cursor: usize,
    sender: Option<SocketAddr>,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.args == other.args
    }
}

impl Message {
    /// Creates an empty message addressed at `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
            cursor: 0,
            sender: None,
        }
    }

    /// The OSC address this message is sent to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The type tag string: a leading `,` plus one character per argument.
    pub fn type_tags(&self) -> String {
        let mut tags = String::with_capacity(self.args.len() + 1);
        tags.push(',');
        tags.extend(self.args.iter().map(Arg::tag));
        tags
    }

    /// The decoded arguments, in wire order.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Number of arguments.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// The network address this message arrived from, if it was decoded
    /// from a received datagram.
    pub fn sender(&self) -> Option<SocketAddr> {
        self.sender
    }

    /// Appends an already-built argument.
    pub fn write_arg(&mut self, arg: Arg) -> &mut Self {
        self.args.push(arg);
        self
    }

    /// Appends an `i32` argument.
    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.write_arg(Arg::Int(v))
    }

    /// Appends an `f32` argument.
    pub fn write_f32(&mut self, v: f32) -> &mut Self {
        self.write_arg(Arg::Float(v))
    }

    /// Appends a string argument.
    pub fn write_str(&mut self, v: impl Into<String>) -> &mut Self {
        self.write_arg(Arg::Str(v.into()))
    }

    /// Appends a blob argument. An empty blob is valid and still occupies
    /// a tag slot and a zero length prefix.
    pub fn write_blob(&mut self, v: impl Into<Vec<u8>>) -> &mut Self {
        self.write_arg(Arg::Blob(v.into()))
    }

    /// Appends a boolean argument (tag only, no payload).
    pub fn write_bool(&mut self, v: bool) -> &mut Self {
        self.write_arg(Arg::Bool(v))
    }

    /// Appends a nil argument (tag only).
    pub fn write_nil(&mut self) -> &mut Self {
        self.write_arg(Arg::Nil)
    }

    /// Appends an impulse argument (tag only).
    pub fn write_impulse(&mut self) -> &mut Self {
        self.write_arg(Arg::Impulse)
    }

    /// Appends a time-tag argument.
    pub fn write_time_tag(&mut self, v: TimeTag) -> &mut Self {
        self.write_arg(Arg::Time(v))
    }

    /// Rewinds the read cursor to the first argument.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    fn peek(&self, expected: char) -> Result<&Arg, ProtocolError> {
        let arg = self
            .args
            .get(self.cursor)
            .ok_or(ProtocolError::CursorOutOfBounds)?;
        let found = arg.tag();
        // Either boolean tag satisfies a boolean read.
        let matches = if expected == tag::TRUE {
            found == tag::TRUE || found == tag::FALSE
        } else {
            found == expected
        };
        if !matches {
            return Err(ProtocolError::TypeMismatch { expected, found });
        }
        Ok(arg)
    }

    /// Reads the `i32` at the cursor and advances.
    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        let v = match self.peek(tag::INT)? {
            Arg::Int(v) => *v,
            _ => unreachable!("peek checked the tag"),
        };
        self.cursor += 1;
        Ok(v)
    }

    /// Reads the `f32` at the cursor and advances.
    pub fn read_f32(&mut self) -> Result<f32, ProtocolError> {
        let v = match self.peek(tag::FLOAT)? {
            Arg::Float(v) => *v,
            _ => unreachable!("peek checked the tag"),
        };
        self.cursor += 1;
        Ok(v)
    }

    /// Reads the string at the cursor and advances.
    pub fn read_str(&mut self) -> Result<String, ProtocolError> {
        let v = match self.peek(tag::STRING)? {
            Arg::Str(v) => v.clone(),
            _ => unreachable!("peek checked the tag"),
        };
        self.cursor += 1;
        Ok(v)
    }

    /// Reads the blob at the cursor and advances.
    pub fn read_blob(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let v = match self.peek(tag::BLOB)? {
            Arg::Blob(v) => v.clone(),
            _ => unreachable!("peek checked the tag"),
        };
        self.cursor += 1;
        Ok(v)
    }

    /// Reads the boolean at the cursor and advances. The value is answered
    /// from the tag alone; no payload bytes are involved.
    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        let v = match self.peek(tag::TRUE)? {
            Arg::Bool(v) => *v,
            _ => unreachable!("peek checked the tag"),
        };
        self.cursor += 1;
        Ok(v)
    }

    /// Reads the time-tag at the cursor and advances.
    pub fn read_time_tag(&mut self) -> Result<TimeTag, ProtocolError> {
        let v = match self.peek(tag::TIME)? {
            Arg::Time(v) => *v,
            _ => unreachable!("peek checked the tag"),
        };
        self.cursor += 1;
        Ok(v)
    }

    /// Serializes the message: address, type tag string, then each
    /// argument's payload, every field padded to a 4-byte boundary.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        w.put_str(&self.address);
        w.put_str(&self.type_tags());
        for arg in &self.args {
            arg.encode(&mut w);
        }
        w.into_bytes()
    }

    /// Decodes a message, requiring the address to begin with `/`.
    pub fn decode(data: &[u8], sender: Option<SocketAddr>) -> Result<Self, ProtocolError> {
        Self::decode_impl(data, sender, true)
    }

    /// Decodes a message, accepting any address string.
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

        let mut r = WireReader::new(data);
        let address = r.read_str()?;
        if strict && !address.starts_with('/') {
            return Err(ProtocolError::InvalidAddress(address));
        }

        let tags = r.read_str()?;
        let mut chars = tags.chars();
        match chars.next() {
            Some(',') => {}
            Some(other) => return Err(ProtocolError::InvalidTypeTag(other)),
            None => return Err(ProtocolError::InvalidTypeTag('\0')),
        }

        let mut args = Vec::new();
        for tag_char in chars {
            args.push(Arg::decode(tag_char, &mut r)?);
        }

        if !r.is_empty() {
            return Err(ProtocolError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            address,
            args,
            cursor: 0,
            sender,
        })
    }

    /// A copy with the read cursor rewound, handed to each handler during
    /// dispatch.
    pub fn fresh_clone(&self) -> Self {
        let mut clone = self.clone();
        clone.reset_cursor();
        clone
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, self.type_tags())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
