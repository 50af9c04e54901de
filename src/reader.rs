use crate::{DecodeConfig, EncoderError, Result};
use bytes::Bytes;

/// A cursor over an encoded buffer.
///
/// Reads advance the cursor; [`Reader::peek_u8`] does not. [`Reader::push_back`]
/// undoes the most recent single-byte read, which is how shape probes leave
/// the input untouched on a mismatch. The reader also tracks container nesting
/// against [`DecodeConfig::max_depth`].
#[derive(Debug, Clone)]
pub struct Reader {
    buf: Bytes,
    pos: usize,
    depth: usize,
    config: DecodeConfig,
}

impl Reader {
    pub fn new(buf: Bytes) -> Self {
        Self::with_config(buf, DecodeConfig::default())
    }

    pub fn with_config(buf: Bytes, config: DecodeConfig) -> Self {
        Self {
            buf,
            pos: 0,
            depth: 0,
            config,
        }
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(EncoderError::Truncated)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Undo the most recent single-byte read.
    pub fn push_back(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    /// Reads exactly `len` bytes or fails with `Truncated` without consuming anything.
    pub fn read_exact(&mut self, len: usize) -> Result<Bytes> {
        if self.remaining() < len {
            return Err(EncoderError::Truncated);
        }
        let out = self.buf.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(out)
    }

    /// Reads up to and including `delim` and returns the bytes before it.
    pub fn read_until(&mut self, delim: u8) -> Result<Bytes> {
        let offset = self.buf[self.pos..]
            .iter()
            .position(|&b| b == delim)
            .ok_or(EncoderError::Truncated)?;
        let out = self.buf.slice(self.pos..self.pos + offset);
        self.pos += offset + 1;
        Ok(out)
    }

    /// The unread part of the buffer.
    pub fn into_remaining(self) -> Bytes {
        self.buf.slice(self.pos..)
    }

    /// Runs `f` one container level deeper. The depth is restored whether `f` succeeds
    /// or fails, so a reader stays usable after a recovered error.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.enter()?;
        let result = f(self);
        self.leave();
        result
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.config.max_depth {
            tracing::debug!(
                max_depth = self.config.max_depth,
                position = self.pos,
                "nesting depth limit reached"
            );
            return Err(EncoderError::DepthLimitExceeded(self.config.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_advance() {
        let reader = Reader::new(Bytes::from_static(b"ie"));
        assert_eq!(reader.peek_u8().unwrap(), b'i');
        assert_eq!(reader.peek_u8().unwrap(), b'i');
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_push_back_restores_last_byte() {
        let mut reader = Reader::new(Bytes::from_static(b"ab"));
        assert_eq!(reader.read_u8().unwrap(), b'a');
        reader.push_back();
        assert_eq!(reader.read_u8().unwrap(), b'a');
        assert_eq!(reader.read_u8().unwrap(), b'b');
        assert!(matches!(reader.read_u8(), Err(EncoderError::Truncated)));
    }

    #[test]
    fn test_read_exact_short_input() {
        let mut reader = Reader::new(Bytes::from_static(b"abc"));
        assert!(matches!(reader.read_exact(4), Err(EncoderError::Truncated)));
        assert_eq!(reader.position(), 0);
        assert_eq!(&reader.read_exact(3).unwrap()[..], b"abc");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_until_consumes_delimiter() {
        let mut reader = Reader::new(Bytes::from_static(b"-42e7"));
        assert_eq!(&reader.read_until(b'e').unwrap()[..], b"-42");
        assert_eq!(&reader.into_remaining()[..], b"7");
    }

    #[test]
    fn test_read_until_missing_delimiter() {
        let mut reader = Reader::new(Bytes::from_static(b"42"));
        assert!(matches!(reader.read_until(b'e'), Err(EncoderError::Truncated)));
    }

    #[test]
    fn test_depth_limit() {
        let config = DecodeConfig::default().with_max_depth(1);
        let mut reader = Reader::with_config(Bytes::new(), config);
        reader.enter().unwrap();
        assert!(matches!(
            reader.enter(),
            Err(EncoderError::DepthLimitExceeded(1))
        ));
        reader.leave();
        reader.enter().unwrap();
    }

    #[test]
    fn test_nested_restores_depth_on_error() {
        let config = DecodeConfig::default().with_max_depth(1);
        let mut reader = Reader::with_config(Bytes::new(), config);
        let failed: Result<()> = reader.nested(|r| r.read_u8().map(|_| ()));
        assert!(matches!(failed, Err(EncoderError::Truncated)));
        assert_eq!(reader.depth, 0);
        reader.nested(|_| Ok(())).unwrap();
        assert!(matches!(
            reader.nested(|r| r.nested(|_| Ok(()))),
            Err(EncoderError::DepthLimitExceeded(1))
        ));
        assert_eq!(reader.depth, 0);
    }
}
