//! # bencode-typed
//!
//! A schema-directed bencode encoder and decoder for Rust.
//!
//! - Integers, byte strings, lists and dictionaries map directly onto Rust types; no
//!   intermediate document tree is built
//! - Decoding is driven by the destination type: each type knows which token it expects
//! - Structs become dictionaries through `#[derive(Encode, Decode)]`, keyed by explicit tags
//! - Encoding is canonical: dictionary keys are always written in ascending byte order
//!
//! ## Attribute Macros
//!
//! - `#[bencode(tag = "name")]`: Maps the field to the dictionary key `name`. Fields without a tag
//!   are invisible to the codec: never written, never read.
//! - `#[bencode(tag = "name", required)]`: Decoding fails with
//!   [`EncoderError::MissingRequiredField`] if the key is absent.
//!
//! `Option<T>` fields are omitted from the output when `None`.
//!
//! ## Feature Flags
//!
//! - `smol_str`: Enables encoding/decoding of `smol_str::SmolStr` as a byte string.
//!
//! ## Example
//!
//! ```rust
//! use bencode_typed::{decode, encode, Decode, Encode};
//!
//! #[derive(Encode, Decode, PartialEq, Debug)]
//! struct Peer {
//!     #[bencode(tag = "port")]
//!     port: i64,
//!     #[bencode(tag = "ip")]
//!     ip: String,
//! }
//!
//! let peer = Peer { port: 6881, ip: "10.0.0.1".to_string() };
//! let mut buf = encode(&peer).unwrap();
//! assert_eq!(&buf[..], b"d2:ip8:10.0.0.14:porti6881ee");
//! let decoded: Peer = decode(&mut buf).unwrap();
//! assert_eq!(peer, decoded);
//! ```

mod config;
pub mod core;
mod features;
mod reader;
mod record;

pub use crate::config::{DecodeConfig, DuplicateKeys, UnknownFields, DEFAULT_MAX_DEPTH};
pub use crate::core::skip_value;
pub use crate::reader::Reader;
pub use crate::record::{
    canonical_order, decode_record, encode_record, resolve_field, DecodeRecord, EncodeRecord,
    Field,
};
pub use bencode_typed_derive::{Decode, Encode};
pub use bytes::{Buf, BufMut, Bytes, BytesMut};

use std::fmt;

/// The four value kinds of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Integer,
    ByteString,
    List,
    Dict,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Integer => "integer",
            Shape::ByteString => "byte string",
            Shape::List => "list",
            Shape::Dict => "dict",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during encoding or decoding operations.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    /// The input ended before a length-declared or terminator-delimited value was complete.
    #[error("Input ended before the value was complete")]
    Truncated,
    /// The next token does not start the shape the destination expects. The token is not consumed.
    #[error("Expected {expected}, got byte 0x{found:02x}")]
    TypeMismatch { expected: Shape, found: u8 },
    /// An integer literal is empty, non-canonical, or does not fit the destination type.
    #[error("Malformed integer: {0}")]
    MalformedNumber(String),
    /// A byte string length prefix could not be parsed.
    #[error("Malformed byte string length: {0}")]
    MalformedLength(String),
    /// A byte that starts no value was found where a value was required.
    #[error("Unrecognized token 0x{0:02x}")]
    UnrecognizedToken(u8),
    /// A dict contains something other than a byte string key or the terminator where a key was expected.
    #[error("Malformed dict: expected a key or 'e', got byte 0x{0:02x}")]
    MalformedDict(u8),
    /// A byte string decoded into a text destination is not valid UTF-8.
    #[error("Byte string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Containers are nested deeper than the configured limit.
    #[error("Nesting depth exceeds the limit of {0}")]
    DepthLimitExceeded(usize),
    /// A record's field table lists a slot the record cannot provide.
    #[error("Record {record} has no tagged field at slot {index}")]
    MissingTag { record: &'static str, index: usize },
    /// A field marked `required` was absent from the dict.
    #[error("Required field '{field}' (key '{tag}') not found for record {record}")]
    MissingRequiredField {
        record: &'static str,
        field: &'static str,
        tag: &'static str,
    },
    /// A key appeared twice and the configuration rejects duplicates.
    #[error("Duplicate key '{tag}' for record {record}")]
    DuplicateKey {
        record: &'static str,
        tag: &'static str,
    },
    /// A key matched no tag and the configuration rejects unknown keys.
    #[error("Unknown key '{key}' for record {record}")]
    UnknownField { record: &'static str, key: String },
    /// The value has no mapping to the wire format.
    #[error("Unsupported shape: {0}")]
    UnsupportedShape(&'static str),
}

/// The result type used throughout this crate for encode/decode operations.
///
/// All `Encoder` and `Decoder` trait methods return this type.
pub type Result<T> = std::result::Result<T, EncoderError>;

/// Trait for types that can be written as a bencode value.
///
/// Most users should use `#[derive(Encode)]` on structs instead of a manual implementation.
pub trait Encoder {
    /// Append the encoded value to `writer`.
    fn encode(&self, writer: &mut BytesMut) -> Result<()>;

    /// Returns true if the value has nothing to write. Record fields reporting
    /// this are omitted together with their key.
    fn is_absent(&self) -> bool {
        false
    }
}

/// Trait for types that can be filled from a bencode value.
///
/// Most users should use `#[derive(Decode)]` on structs instead of a manual implementation.
pub trait Decoder: Sized {
    /// Decode exactly one value from `reader`.
    fn decode(reader: &mut Reader) -> Result<Self>;

    /// Decode exactly one value from `reader` into `self`.
    ///
    /// Records override this to assign only the fields present in the input; everything
    /// else replaces `self` wholesale. On error `self` may be partially updated.
    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        *self = Self::decode(reader)?;
        Ok(())
    }
}

/// Convenience function to encode a value to bytes.
///
/// # Example
/// ```rust
/// use bencode_typed::encode;
///
/// assert_eq!(&encode(&123i64).unwrap()[..], b"i123e");
/// assert_eq!(&encode("test").unwrap()[..], b"4:test");
/// ```
pub fn encode<T: Encoder + ?Sized>(value: &T) -> Result<Bytes> {
    let mut writer = BytesMut::new();
    value.encode(&mut writer)?;
    Ok(writer.freeze())
}

/// Convenience function to decode one value from the front of `reader`.
///
/// On success `reader` is advanced past the value; trailing bytes are left in
/// place so a sequence of top-level values can be read by repeated calls. On
/// error `reader` is left untouched.
///
/// # Example
/// ```rust
/// use bencode_typed::{decode, Bytes};
///
/// let mut buf = Bytes::from_static(b"li1ei2ei3ee4:tail");
/// let list: Vec<i64> = decode(&mut buf).unwrap();
/// assert_eq!(list, vec![1, 2, 3]);
/// let tail: String = decode(&mut buf).unwrap();
/// assert_eq!(tail, "tail");
/// assert!(buf.is_empty());
/// ```
pub fn decode<T: Decoder>(reader: &mut Bytes) -> Result<T> {
    decode_with(reader, &DecodeConfig::default())
}

/// Like [`decode`], with an explicit [`DecodeConfig`].
pub fn decode_with<T: Decoder>(reader: &mut Bytes, config: &DecodeConfig) -> Result<T> {
    let mut source = Reader::with_config(reader.clone(), *config);
    let value = T::decode(&mut source)?;
    reader.advance(source.position());
    Ok(value)
}

/// Decode one value from the front of `reader` into an existing destination.
///
/// For records, dict keys absent from the input leave the corresponding fields
/// unchanged. The destination is not guaranteed to be unmodified on failure.
pub fn decode_into<T: Decoder>(dest: &mut T, reader: &mut Bytes) -> Result<()> {
    decode_into_with(dest, reader, &DecodeConfig::default())
}

/// Like [`decode_into`], with an explicit [`DecodeConfig`].
pub fn decode_into_with<T: Decoder>(
    dest: &mut T,
    reader: &mut Bytes,
    config: &DecodeConfig,
) -> Result<()> {
    let mut source = Reader::with_config(reader.clone(), *config);
    dest.decode_into(&mut source)?;
    reader.advance(source.position());
    Ok(())
}

/// Decode one value from a byte slice, ignoring anything after it.
pub fn decode_slice<T: Decoder>(data: &[u8]) -> Result<T> {
    decode(&mut Bytes::copy_from_slice(data))
}
