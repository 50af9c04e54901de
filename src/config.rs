/// Default limit on container nesting during decode.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// What a record decoder does when the same tagged key appears more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeys {
    /// Every occurrence is decoded into the field; the last one stays.
    #[default]
    LastWins,
    /// The first occurrence is kept; later values are skipped.
    FirstWins,
    /// A repeated key fails with `EncoderError::DuplicateKey`.
    Reject,
}

/// What a record decoder does with a key that matches no tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFields {
    /// The value is structurally skipped.
    #[default]
    Skip,
    /// The key fails with `EncoderError::UnknownField`.
    Reject,
}

/// Decoder settings.
///
/// ```rust
/// use bencode_typed::{DecodeConfig, DuplicateKeys};
///
/// let config = DecodeConfig::default()
///     .with_max_depth(16)
///     .with_duplicate_keys(DuplicateKeys::Reject);
/// assert_eq!(config.max_depth, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Maximum number of nested lists/dicts. Exceeding it fails with
    /// `EncoderError::DepthLimitExceeded`.
    pub max_depth: usize,
    pub duplicate_keys: DuplicateKeys,
    pub unknown_fields: UnknownFields,
    /// Accept only canonical integers and length prefixes: no `+`, no leading
    /// zeros, no `-0`.
    pub strict_integers: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            duplicate_keys: DuplicateKeys::default(),
            unknown_fields: UnknownFields::default(),
            strict_integers: true,
        }
    }
}

impl DecodeConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    pub fn with_unknown_fields(mut self, policy: UnknownFields) -> Self {
        self.unknown_fields = policy;
        self
    }

    pub fn with_strict_integers(mut self, strict: bool) -> Self {
        self.strict_integers = strict;
        self
    }
}
