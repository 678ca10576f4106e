use serde::{Deserialize, Serialize};

use crate::buffer::DEFAULT_MAX_STRING_LEN;

/// Decoder knobs. The defaults reproduce the behaviour of already persisted data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DecodeOptions {
    /// Fail with `MalformedDiscriminator` on an unknown `type`/`security`
    /// instead of skipping the branch fields.
    pub strict_discriminators: bool,
    pub max_string_len: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict_discriminators: false,
            max_string_len: DEFAULT_MAX_STRING_LEN,
        }
    }
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            strict_discriminators: true,
            ..Self::default()
        }
    }
}
