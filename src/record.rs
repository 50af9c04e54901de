use crate::core::{expect_token, read_byte_string, skip_value, write_byte_string};
use crate::core::{TOKEN_DICT, TOKEN_END};
use crate::*;

/// One tagged field of a record: the dict key it maps to and whether decode requires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub tag: &'static str,
    /// Rust field name, reported by `MissingRequiredField`.
    pub name: &'static str,
    pub required: bool,
}

/// Encoding side of a tagged record. Generated by `#[derive(Encode)]`.
///
/// `FIELDS` lists only the tagged fields, in any order; slot `i` of the table is the value
/// returned by `field(i)`.
pub trait EncodeRecord {
    const NAME: &'static str;
    const FIELDS: &'static [Field];

    fn field(&self, index: usize) -> Option<&dyn Encoder>;
}

/// Decoding side of a tagged record. Generated by `#[derive(Decode)]`.
pub trait DecodeRecord {
    const NAME: &'static str;
    const FIELDS: &'static [Field];

    /// Decode the next value into the field at slot `index`.
    fn decode_field(&mut self, index: usize, reader: &mut Reader) -> Result<()>;
}

/// Finds the slot whose tag equals `key`, byte for byte.
pub fn resolve_field(fields: &[Field], key: &[u8]) -> Option<usize> {
    fields.iter().position(|f| f.tag.as_bytes() == key)
}

/// Slots ordered by tag. `str` ordering is byte-wise, which is the order dict keys must be
/// written in.
pub fn canonical_order(fields: &[Field]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fields.len()).collect();
    order.sort_by(|&a, &b| fields[a].tag.cmp(fields[b].tag));
    order
}

/// Writes `record` as a dict with its tagged fields in canonical order.
///
/// Fields whose value reports [`Encoder::is_absent`] are left out with their key.
///
/// # Errors
/// `MissingTag` if the record cannot provide a slot its table lists, plus any error from
/// the field values.
pub fn encode_record<R: EncodeRecord + ?Sized>(record: &R, writer: &mut BytesMut) -> Result<()> {
    writer.put_u8(TOKEN_DICT);
    for index in canonical_order(R::FIELDS) {
        let value = record.field(index).ok_or(EncoderError::MissingTag {
            record: R::NAME,
            index,
        })?;
        if value.is_absent() {
            continue;
        }
        write_byte_string(writer, R::FIELDS[index].tag.as_bytes());
        value.encode(writer)?;
    }
    writer.put_u8(TOKEN_END);
    Ok(())
}

/// Reads a dict into `record`, assigning the fields whose tags appear as keys.
///
/// Keys with no matching tag are skipped (or rejected, per [`UnknownFields`]). Repeated keys
/// follow [`DuplicateKeys`]. Fields whose keys are absent keep their current value.
///
/// # Errors
/// `TypeMismatch` (not consumed) if the next byte is not `d`, `MalformedDict` if something
/// other than a key or `e` appears where a key is expected, `MissingRequiredField` if a
/// required key is absent, plus any error from the keys and values.
pub fn decode_record<R: DecodeRecord + ?Sized>(record: &mut R, reader: &mut Reader) -> Result<()> {
    expect_token(reader, TOKEN_DICT, Shape::Dict)?;
    let seen = reader.nested(|reader| decode_entries(record, reader))?;

    if let Some(field) = R::FIELDS
        .iter()
        .zip(&seen)
        .find(|(field, seen)| field.required && !**seen)
        .map(|(field, _)| field)
    {
        return Err(EncoderError::MissingRequiredField {
            record: R::NAME,
            field: field.name,
            tag: field.tag,
        });
    }
    Ok(())
}

/// Reads key/value pairs through the closing `e`, returning which slots were assigned.
fn decode_entries<R: DecodeRecord + ?Sized>(
    record: &mut R,
    reader: &mut Reader,
) -> Result<Vec<bool>> {
    let mut seen = vec![false; R::FIELDS.len()];
    loop {
        match reader.peek_u8()? {
            TOKEN_END => {
                reader.read_u8()?;
                return Ok(seen);
            }
            b'0'..=b'9' => {}
            other => return Err(EncoderError::MalformedDict(other)),
        }
        let key = read_byte_string(reader)?;
        let Some(index) = resolve_field(R::FIELDS, &key) else {
            match reader.config().unknown_fields {
                UnknownFields::Skip => {
                    tracing::trace!(
                        record = R::NAME,
                        key = %String::from_utf8_lossy(&key),
                        "skipping unknown dict key"
                    );
                    skip_value(reader)?;
                    continue;
                }
                UnknownFields::Reject => {
                    return Err(EncoderError::UnknownField {
                        record: R::NAME,
                        key: String::from_utf8_lossy(&key).into_owned(),
                    })
                }
            }
        };
        if seen[index] {
            let tag = R::FIELDS[index].tag;
            match reader.config().duplicate_keys {
                DuplicateKeys::LastWins => {
                    tracing::debug!(record = R::NAME, tag, "duplicate key, keeping last value");
                }
                DuplicateKeys::FirstWins => {
                    tracing::debug!(record = R::NAME, tag, "duplicate key, keeping first value");
                    skip_value(reader)?;
                    continue;
                }
                DuplicateKeys::Reject => {
                    return Err(EncoderError::DuplicateKey {
                        record: R::NAME,
                        tag,
                    })
                }
            }
        }
        record.decode_field(index, reader)?;
        seen[index] = true;
    }
}
