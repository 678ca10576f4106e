use serde::{Deserialize, Serialize};

use crate::normalize::{blank_or, unset_or_value};

/// Transport selected by the `type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Tcp,
    Kcp,
    Ws,
    Http,
    Quic,
    Grpc,
}

impl Network {
    pub const ALL: [Network; 6] = [
        Network::Tcp,
        Network::Kcp,
        Network::Ws,
        Network::Http,
        Network::Quic,
        Network::Grpc,
    ];

    /// Exact wire names only. `h2` is a legacy alias handled by normalization,
    /// not by the codec.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "tcp" => Some(Self::Tcp),
            "kcp" => Some(Self::Kcp),
            "ws" => Some(Self::Ws),
            "http" => Some(Self::Http),
            "quic" => Some(Self::Quic),
            "grpc" => Some(Self::Grpc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Kcp => "kcp",
            Self::Ws => "ws",
            Self::Http => "http",
            Self::Quic => "quic",
            Self::Grpc => "grpc",
        }
    }
}

/// Value of the `security` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Security {
    None,
    Tls,
}

impl Security {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "" | "none" => Some(Self::None),
            "tls" => Some(Self::Tls),
            _ => None,
        }
    }
}

/// `packetEncoding` enum: 0 none, 1 packetaddr, 2 xudp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketEncoding {
    None = 0,
    Packet = 1,
    Xudp = 2,
}

impl PacketEncoding {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::None),
            1 => Some(Self::Packet),
            2 => Some(Self::Xudp),
            _ => None,
        }
    }

    pub fn from_query(raw: &str) -> Option<Self> {
        match raw {
            "packet" => Some(Self::Packet),
            "xudp" => Some(Self::Xudp),
            _ => None,
        }
    }

    pub fn query_name(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Packet => Some("packet"),
            Self::Xudp => Some("xudp"),
        }
    }
}

/// Transport and TLS settings shared by VMess, VLESS and Trojan.
///
/// Only the fields selected by `network` and `security` are meaningful; the
/// rest keep their defaults and never reach the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    pub uuid: Option<String>,
    pub encryption: Option<String>,
    #[serde(rename = "type")]
    pub network: Option<String>,

    pub host: Option<String>,
    pub path: Option<String>,
    pub header_type: Option<String>,
    pub mkcp_seed: Option<String>,
    pub quic_security: Option<String>,
    pub quic_key: Option<String>,
    pub grpc_service_name: Option<String>,
    pub ws_max_early_data: Option<i32>,
    pub ws_use_browser_forwarder: Option<bool>,
    pub early_data_header_name: Option<String>,

    pub security: Option<String>,
    pub sni: Option<String>,
    pub alpn: Option<String>,
    pub certificates: Option<String>,
    pub pinned_peer_cert_sha256: Option<String>,
    pub allow_insecure: Option<bool>,
    pub utls_fingerprint: Option<String>,

    pub packet_encoding: Option<i32>,
}

impl StreamSettings {
    pub(crate) fn initialize_default_values(&mut self, encryption: &str, security: &str) {
        blank_or(&mut self.uuid, "");
        blank_or(&mut self.encryption, encryption);

        blank_or(&mut self.network, "tcp");
        if self.network.as_deref() == Some("h2") {
            self.network = Some("http".to_string());
        }

        blank_or(&mut self.host, "");
        blank_or(&mut self.path, "/");
        blank_or(&mut self.header_type, "");
        blank_or(&mut self.mkcp_seed, "");
        blank_or(&mut self.quic_security, "");
        blank_or(&mut self.quic_key, "");

        blank_or(&mut self.security, security);
        blank_or(&mut self.sni, "");
        blank_or(&mut self.alpn, "");

        blank_or(&mut self.grpc_service_name, "");
        blank_or(&mut self.certificates, "");
        blank_or(&mut self.pinned_peer_cert_sha256, "");
        blank_or(&mut self.early_data_header_name, "");
        blank_or(&mut self.utls_fingerprint, "");

        unset_or_value(&mut self.ws_max_early_data, 0);
        unset_or_value(&mut self.ws_use_browser_forwarder, false);
        unset_or_value(&mut self.allow_insecure, false);
        unset_or_value(&mut self.packet_encoding, 0);
    }

    pub fn network_kind(&self) -> Option<Network> {
        self.network.as_deref().and_then(Network::parse)
    }

    pub fn is_tls(&self) -> bool {
        self.security.as_deref() == Some("tls")
    }
}
