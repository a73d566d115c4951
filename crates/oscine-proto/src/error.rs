//! Error types for the packet codec.
//!
//! Every failure mode of the wire layer is a `ProtocolError` variant, so
//! callers can match on exactly what went wrong instead of parsing strings.

/// Errors that can occur while encoding or decoding OSC packets.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The input ended before a complete field could be read.
    #[error("truncated packet: needed {needed} more bytes")]
    Truncated {
        /// How many additional bytes the current field required.
        needed: usize,
    },

    /// A buffer that must be a multiple of 4 bytes long is not.
    #[error("payload length {0} is not 4-byte aligned")]
    Unaligned(usize),

    /// The type tag string is missing its leading `,` or contains an
    /// unrecognized tag character.
    #[error("invalid type tag {0:?}")]
    InvalidTypeTag(char),

    /// A message address failed the strict-mode check (must begin with `/`).
    #[error("invalid message address {0:?}")]
    InvalidAddress(String),

    /// A bundle is missing its `#bundle` prefix or declares an element
    /// length that overruns the buffer.
    #[error("invalid bundle: {0}")]
    InvalidBundle(String),

    /// A blob declared a negative payload length.
    #[error("negative blob length {0}")]
    NegativeBlobLength(i32),

    /// Bytes were left over after all declared arguments were decoded.
    #[error("{0} trailing bytes after last argument")]
    TrailingBytes(usize),

    /// A typed read did not match the tag at the cursor. The cursor is
    /// left unchanged.
    #[error("type mismatch: expected tag {expected:?}, found {found:?}")]
    TypeMismatch {
        /// The tag the read expected.
        expected: char,
        /// The tag actually present at the cursor.
        found: char,
    },

    /// A typed read was attempted past the last argument.
    #[error("argument cursor out of bounds")]
    CursorOutOfBounds,

    /// A wire string was not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidString(#[from] std::string::FromUtf8Error),
}
