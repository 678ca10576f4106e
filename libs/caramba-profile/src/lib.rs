//! Proxy profile records and their persisted binary form.
//!
//! Every record family (HTTP, VMess/VLESS, Trojan) is encoded as a version
//! stamp followed by a fixed field order. Decoding accepts every version
//! ever written and normalizes the result, so callers always see a record
//! with no unset fields.

pub mod buffer;
pub mod codec;
pub mod error;
pub mod models;
pub mod options;
pub mod share_link;

pub(crate) mod normalize;

pub use codec::{ProfileCodec, schema_version};
pub use error::{ProfileError, Result, SchemaFamily};
pub use models::{
    HttpProfile, Network, PacketEncoding, Profile, ProfileBase, ProfileKind, Security,
    StandardProfile, StandardProtocol, StreamSettings, TrojanProfile, VmessExtra,
};
pub use options::DecodeOptions;
pub use share_link::{ImportedProfile, parse_share_link};
