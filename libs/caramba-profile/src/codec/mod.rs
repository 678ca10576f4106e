//! Versioned binary codec for profile records.
//!
//! `encode` always stamps the current schema version of the record family.
//! `decode` accepts any historical version listed in [`migration`], reads
//! exactly the fields that version wrote and normalizes the result, so
//! fields unknown to an old writer come back with their defaults.

pub mod migration;

mod base;
mod http;
mod standard;
mod transport;
mod trojan;

#[cfg(test)]
mod tests;

use tracing::warn;

use crate::buffer::{Reader, Writer};
use crate::error::{Result, SchemaFamily};
use crate::models::{Profile, ProfileKind};
use crate::options::DecodeOptions;

pub use transport::carries_grpc_service_name;

/// Binary layout of one record family.
pub trait ProfileCodec {
    const FAMILY: SchemaFamily;
    const CURRENT_VERSION: i32;

    /// Write the full stream, version stamp included, using the layout of
    /// `version`.
    fn write_at(&self, w: &mut Writer, version: i32) -> Result<()>;

    /// Read a full stream into `self`, returning the version it was written with.
    fn read_from(&mut self, r: &mut Reader<'_>, opts: &DecodeOptions) -> Result<i32>;

    fn normalize(&mut self);

    fn encode(&self) -> Result<Vec<u8>> {
        self.encode_at_version(Self::CURRENT_VERSION)
    }

    /// Produce the stream an older writer would have produced. Meant for
    /// compatibility fixtures; regular writes go through [`encode`](Self::encode).
    fn encode_at_version(&self, version: i32) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        self.write_at(&mut w, version)?;
        Ok(w.dump())
    }

    fn decode_into(&mut self, bytes: &[u8], opts: &DecodeOptions) -> Result<i32> {
        let mut r = Reader::with_limit(bytes, opts.max_string_len);
        let version = self.read_from(&mut r, opts)?;
        if r.remaining() > 0 {
            warn!(
                "{} profile v{} left {} trailing byte(s) unread",
                Self::FAMILY,
                version,
                r.remaining()
            );
        }
        self.normalize();
        Ok(version)
    }
}

/// Peek the version stamp at the head of an encoded profile.
pub fn schema_version(bytes: &[u8]) -> Result<i32> {
    Reader::new(bytes).read_i32()
}

impl Profile {
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Profile::Http(p) => p.encode(),
            Profile::Standard(p) => p.encode(),
            Profile::Trojan(p) => p.encode(),
        }
    }

    pub fn encode_at_version(&self, version: i32) -> Result<Vec<u8>> {
        match self {
            Profile::Http(p) => p.encode_at_version(version),
            Profile::Standard(p) => p.encode_at_version(version),
            Profile::Trojan(p) => p.encode_at_version(version),
        }
    }

    pub fn decode(kind: ProfileKind, bytes: &[u8]) -> Result<Profile> {
        Self::decode_with(kind, bytes, &DecodeOptions::default())
    }

    pub fn decode_with(kind: ProfileKind, bytes: &[u8], opts: &DecodeOptions) -> Result<Profile> {
        let mut profile = Profile::empty(kind);
        match &mut profile {
            Profile::Http(p) => p.decode_into(bytes, opts)?,
            Profile::Standard(p) => p.decode_into(bytes, opts)?,
            Profile::Trojan(p) => p.decode_into(bytes, opts)?,
        };
        Ok(profile)
    }

    /// Decode any supported version and write it back at the current one.
    pub fn migrate(kind: ProfileKind, bytes: &[u8], opts: &DecodeOptions) -> Result<Vec<u8>> {
        Self::decode_with(kind, bytes, opts)?.encode()
    }

    pub fn current_version(kind: ProfileKind) -> i32 {
        match kind {
            ProfileKind::Http => migration::HTTP_SCHEMA_VERSION,
            ProfileKind::Vmess | ProfileKind::Vless => migration::STANDARD_SCHEMA_VERSION,
            ProfileKind::Trojan => migration::TROJAN_SCHEMA_VERSION,
        }
    }
}
