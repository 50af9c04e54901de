#[cfg(feature = "smol_str")]
use smol_str::SmolStr;

#[allow(unused_imports)]
use crate::core::*;
#[allow(unused_imports)]
use crate::*;

// --- SmolStr ---
/// Encodes a `SmolStr` as a byte string of its UTF-8 bytes.
#[cfg(feature = "smol_str")]
impl Encoder for SmolStr {
    fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        write_byte_string(writer, self.as_bytes());
        Ok(())
    }
}
/// Decodes a byte string that must be valid UTF-8.
#[cfg(feature = "smol_str")]
impl Decoder for SmolStr {
    fn decode(reader: &mut Reader) -> Result<Self> {
        let bytes = read_byte_string(reader)?;
        Ok(SmolStr::new(std::str::from_utf8(&bytes)?))
    }
}
