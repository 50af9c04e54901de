use crate::*;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

/// Tokens of the bencode wire format.
///
/// Every value starts with one of `i`, `l`, `d` or a decimal digit; containers end with `e`.
/// Most users do not need to use these directly.
pub const TOKEN_INTEGER: u8 = b'i';
pub const TOKEN_LIST: u8 = b'l';
pub const TOKEN_DICT: u8 = b'd';
///< Terminates integers, lists and dicts. Starts no value.
pub const TOKEN_END: u8 = b'e';
///< Separates a byte string's length prefix from its payload.
pub const TOKEN_LENGTH_DELIMITER: u8 = b':';

/// Consumes `token` or fails with `TypeMismatch`, leaving the reader where it was.
#[inline]
pub fn expect_token(reader: &mut Reader, token: u8, expected: Shape) -> Result<()> {
    let found = reader.read_u8()?;
    if found != token {
        reader.push_back();
        return Err(EncoderError::TypeMismatch { expected, found });
    }
    Ok(())
}

fn put_decimal<T: Display>(writer: &mut BytesMut, value: T) {
    writer.put_slice(value.to_string().as_bytes());
}

/// Writes `bytes` as a length-prefixed byte string.
pub fn write_byte_string(writer: &mut BytesMut, bytes: &[u8]) {
    put_decimal(writer, bytes.len());
    writer.put_u8(TOKEN_LENGTH_DELIMITER);
    writer.put_slice(bytes);
}

/// Writes `value` as `i<decimal>e`.
pub fn write_integer<T: Display>(writer: &mut BytesMut, value: T) {
    writer.put_u8(TOKEN_INTEGER);
    put_decimal(writer, value);
    writer.put_u8(TOKEN_END);
}

// --- Integer tokens ---
/// Reads an integer token and returns the literal between `i` and `e`.
///
/// The literal is syntax-checked but not range-checked, so integers wider than any Rust type
/// can still be skipped.
///
/// # Errors
/// `TypeMismatch` (not consumed) if the next byte is not `i`, `Truncated` if no `e` follows,
/// `MalformedNumber` if the literal is not a decimal integer.
pub fn read_integer_literal(reader: &mut Reader) -> Result<Bytes> {
    expect_token(reader, TOKEN_INTEGER, Shape::Integer)?;
    let literal = reader.read_until(TOKEN_END)?;
    check_integer_literal(&literal, reader.config().strict_integers)?;
    Ok(literal)
}

fn check_integer_literal(literal: &[u8], strict: bool) -> Result<()> {
    let malformed = |reason: &str| {
        EncoderError::MalformedNumber(format!(
            "{} in {:?}",
            reason,
            String::from_utf8_lossy(literal)
        ))
    };
    let (negative, digits) = match literal {
        [b'-', rest @ ..] => (true, rest),
        [b'+', rest @ ..] if !strict => (false, rest),
        _ => (false, literal),
    };
    if digits.is_empty() {
        return Err(malformed("missing digits"));
    }
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed("non-digit character"));
    }
    if strict {
        if digits.len() > 1 && digits[0] == b'0' {
            return Err(malformed("leading zero"));
        }
        if negative && digits == b"0" {
            return Err(malformed("negative zero"));
        }
    }
    Ok(())
}

/// Decodes an integer token into any type parseable from a decimal literal.
pub fn decode_integer<T>(reader: &mut Reader) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let literal = read_integer_literal(reader)?;
    // checked above: ASCII sign and digits only
    let text = std::str::from_utf8(&literal)?;
    text.parse::<T>().map_err(|e| {
        EncoderError::MalformedNumber(format!(
            "{:?} as {}: {}",
            text,
            std::any::type_name::<T>(),
            e
        ))
    })
}

// --- Byte string tokens ---
/// Reads a length-prefixed byte string and returns its payload.
///
/// # Errors
/// `TypeMismatch` (not consumed) if the next byte is not a digit, `MalformedLength` if the
/// prefix is not followed by `:` or does not fit `usize`, `Truncated` if the payload is short.
pub fn read_byte_string(reader: &mut Reader) -> Result<Bytes> {
    let first = reader.peek_u8()?;
    if !first.is_ascii_digit() {
        return Err(EncoderError::TypeMismatch {
            expected: Shape::ByteString,
            found: first,
        });
    }
    let mut len: usize = 0;
    let mut digits = 0usize;
    loop {
        match reader.read_u8()? {
            b @ b'0'..=b'9' => {
                len = len
                    .checked_mul(10)
                    .and_then(|l| l.checked_add(usize::from(b - b'0')))
                    .ok_or_else(|| {
                        EncoderError::MalformedLength("length prefix overflows usize".to_string())
                    })?;
                digits += 1;
            }
            TOKEN_LENGTH_DELIMITER => break,
            other => {
                return Err(EncoderError::MalformedLength(format!(
                    "expected ':' after length prefix, got byte 0x{:02x}",
                    other
                )))
            }
        }
    }
    if reader.config().strict_integers && digits > 1 && first == b'0' {
        return Err(EncoderError::MalformedLength(
            "leading zero in length prefix".to_string(),
        ));
    }
    reader.read_exact(len)
}

/// Skips one value of any shape.
///
/// This is used to discard dict entries whose key matches no field. Lists and dicts are
/// skipped element by element, so a dict's keys and values are treated alike.
///
/// # Errors
/// `UnrecognizedToken` if the next byte starts no value (including a stray `e`), plus any
/// error from the nested tokens.
pub fn skip_value(reader: &mut Reader) -> Result<()> {
    match reader.peek_u8()? {
        TOKEN_INTEGER => {
            read_integer_literal(reader)?;
            Ok(())
        }
        b'0'..=b'9' => {
            read_byte_string(reader)?;
            Ok(())
        }
        TOKEN_LIST | TOKEN_DICT => {
            reader.read_u8()?;
            reader.nested(|reader| {
                while reader.peek_u8()? != TOKEN_END {
                    skip_value(reader)?;
                }
                reader.read_u8()?;
                Ok(())
            })
        }
        other => Err(EncoderError::UnrecognizedToken(other)),
    }
}

// --- Integer types ---
/// Encodes integers as `i<decimal>e` and decodes them with a range check against the
/// destination width.
macro_rules! impl_integer {
    ($($t:ty),+) => {
        $(
            impl Encoder for $t {
                fn encode(&self, writer: &mut BytesMut) -> Result<()> {
                    write_integer(writer, self);
                    Ok(())
                }
            }
            impl Decoder for $t {
                fn decode(reader: &mut Reader) -> Result<Self> {
                    decode_integer(reader)
                }
            }
        )+
    };
}

impl_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

// --- String ---
/// Encodes text as a byte string of its UTF-8 bytes.
impl Encoder for str {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_byte_string(writer, self.as_bytes());
        Ok(())
    }
}
impl Encoder for String {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        self.as_str().encode(writer)
    }
}
/// Decodes a byte string that must be valid UTF-8.
impl Decoder for String {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let bytes = read_byte_string(reader)?;
        Ok(std::str::from_utf8(&bytes)?.to_owned())
    }
}

// --- Bytes ---
/// Raw byte strings. Use these for binary payloads such as hashes; `Vec<u8>` is a list of
/// integers.
impl Encoder for Bytes {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_byte_string(writer, self);
        Ok(())
    }
}
impl Decoder for Bytes {
    fn decode(reader: &mut Reader) -> Result<Self> {
        read_byte_string(reader)
    }
}
impl Encoder for BytesMut {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_byte_string(writer, self);
        Ok(())
    }
}

// --- Sequences ---
/// Encodes a slice as `l<elements>e`.
impl<T: Encoder> Encoder for [T] {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        writer.put_u8(TOKEN_LIST);
        for item in self {
            item.encode(writer)?;
        }
        writer.put_u8(TOKEN_END);
        Ok(())
    }
}
impl<T: Encoder> Encoder for Vec<T> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        self.as_slice().encode(writer)
    }
}
/// Decodes a list, element by element, until its terminator.
impl<T: Decoder> Decoder for Vec<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        expect_token(reader, TOKEN_LIST, Shape::List)?;
        reader.nested(|reader| {
            let mut items = Vec::new();
            while reader.peek_u8()? != TOKEN_END {
                items.push(T::decode(reader)?);
            }
            reader.read_u8()?;
            Ok(items)
        })
    }
}

// --- Option ---
/// `Some` encodes the inner value. `None` has no wire form: record fields skip it, anywhere
/// else it is an error.
impl<T: Encoder> Encoder for Option<T> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        match self {
            Some(value) => value.encode(writer),
            None => Err(EncoderError::UnsupportedShape("Option::None")),
        }
    }

    fn is_absent(&self) -> bool {
        self.as_ref().map_or(true, Encoder::is_absent)
    }
}
/// A decoded value is always `Some`.
impl<T: Decoder> Decoder for Option<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(Some(T::decode(reader)?))
    }
}

// --- Smart pointers ---
/// Implementation for references - delegates to the referenced value
impl<T: Encoder + ?Sized> Encoder for &T {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        (**self).encode(writer)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: Encoder + ?Sized> Encoder for Box<T> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        (**self).encode(writer)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}
impl<T: Decoder> Decoder for Box<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(Box::new(T::decode(reader)?))
    }

    fn decode_into(&mut self, reader: &mut Reader) -> Result<()> {
        (**self).decode_into(reader)
    }
}

impl<T: Encoder + ?Sized> Encoder for Arc<T> {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        (**self).encode(writer)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}
impl<T: Decoder> Decoder for Arc<T> {
    fn decode(reader: &mut Reader) -> Result<Self> {
        Ok(Arc::new(T::decode(reader)?))
    }
}
