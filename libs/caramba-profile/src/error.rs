use std::fmt;
use thiserror::Error;

/// Which record family a version tag belongs to.
///
/// Each family keeps its own version counter, so error messages name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaFamily {
    Http,
    Standard,
    Trojan,
}

impl fmt::Display for SchemaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Http => "http",
            Self::Standard => "standard",
            Self::Trojan => "trojan",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("truncated input: need {needed} byte(s) at offset {offset}, buffer has {available}")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("invalid string at offset {offset}: {reason}")]
    InvalidString { offset: usize, reason: String },

    #[error("unsupported {family} schema version {version} (supported: {supported})")]
    UnsupportedSchemaVersion {
        family: SchemaFamily,
        version: i32,
        supported: &'static str,
    },

    #[error("unrecognized {field} discriminator {value:?}")]
    MalformedDiscriminator { field: &'static str, value: String },

    #[error("field `{field}` is unset, call initialize_default_values before encoding")]
    UnnormalizedRecord { field: &'static str },

    #[error("invalid share link: {0}")]
    InvalidShareLink(String),
}

impl ProfileError {
    pub(crate) fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        Self::TruncatedInput {
            offset,
            needed,
            available,
        }
    }

    pub(crate) fn share_link(msg: impl Into<String>) -> Self {
        Self::InvalidShareLink(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ProfileError>;
