pub mod http;
pub mod standard;
pub mod stream;
pub mod trojan;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::normalize::{blank_or, unset_or_value};

pub use http::HttpProfile;
pub use standard::{StandardProfile, StandardProtocol, VmessExtra};
pub use stream::{Network, PacketEncoding, Security, StreamSettings};
pub use trojan::TrojanProfile;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: i32 = 1080;

/// Connection endpoint carried at the head of every encoded profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBase {
    pub server_address: Option<String>,
    pub server_port: Option<i32>,
}

impl ProfileBase {
    pub fn new(address: impl Into<String>, port: i32) -> Self {
        Self {
            server_address: Some(address.into()),
            server_port: Some(port),
        }
    }

    pub fn initialize_default_values(&mut self) {
        blank_or(&mut self.server_address, DEFAULT_SERVER_ADDRESS);
        unset_or_value(&mut self.server_port, DEFAULT_SERVER_PORT);
    }
}

/// Persistence-side tag that picks the decoder for a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Http,
    Vmess,
    Vless,
    Trojan,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Http => "http",
            Self::Vmess => "vmess",
            Self::Vless => "vless",
            Self::Trojan => "trojan",
        };
        f.write_str(s)
    }
}

impl FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "vmess" => Ok(Self::Vmess),
            "vless" => Ok(Self::Vless),
            "trojan" => Ok(Self::Trojan),
            other => Err(format!("unknown profile kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Profile {
    Http(HttpProfile),
    Standard(StandardProfile),
    Trojan(TrojanProfile),
}

impl Profile {
    pub fn kind(&self) -> ProfileKind {
        match self {
            Profile::Http(_) => ProfileKind::Http,
            Profile::Standard(p) => match p.protocol {
                StandardProtocol::Vmess(_) => ProfileKind::Vmess,
                StandardProtocol::Vless => ProfileKind::Vless,
            },
            Profile::Trojan(_) => ProfileKind::Trojan,
        }
    }

    /// Empty record of the given kind, every field unset.
    pub fn empty(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Http => Profile::Http(HttpProfile::default()),
            ProfileKind::Vmess => Profile::Standard(StandardProfile::vmess()),
            ProfileKind::Vless => Profile::Standard(StandardProfile::vless()),
            ProfileKind::Trojan => Profile::Trojan(TrojanProfile::default()),
        }
    }

    pub fn base(&self) -> &ProfileBase {
        match self {
            Profile::Http(p) => &p.base,
            Profile::Standard(p) => &p.base,
            Profile::Trojan(p) => &p.base,
        }
    }

    pub fn initialize_default_values(&mut self) {
        match self {
            Profile::Http(p) => p.initialize_default_values(),
            Profile::Standard(p) => p.initialize_default_values(),
            Profile::Trojan(p) => p.initialize_default_values(),
        }
    }

    /// Copy the user toggles that survive a remote refresh onto `other`.
    /// Does nothing when `other` is a different variant.
    pub fn apply_feature_settings(&self, other: &mut Profile) {
        match (self, other) {
            (Profile::Http(src), Profile::Http(dst)) => src.apply_feature_settings(dst),
            (Profile::Standard(src), Profile::Standard(dst)) => src.apply_feature_settings(dst),
            (Profile::Trojan(src), Profile::Trojan(dst)) => src.apply_feature_settings(dst),
            _ => {}
        }
    }
}

impl From<HttpProfile> for Profile {
    fn from(p: HttpProfile) -> Self {
        Profile::Http(p)
    }
}

impl From<StandardProfile> for Profile {
    fn from(p: StandardProfile) -> Self {
        Profile::Standard(p)
    }
}

impl From<TrojanProfile> for Profile {
    fn from(p: TrojanProfile) -> Self {
        Profile::Trojan(p)
    }
}
