use serde::{Deserialize, Serialize};

use super::{ProfileBase, StreamSettings};
use crate::normalize::unset_or_value;

/// Fields only VMess profiles carry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmessExtra {
    pub alter_id: Option<i32>,
    pub experimental_authenticated_length: Option<bool>,
    pub experimental_no_termination_signal: Option<bool>,
}

impl VmessExtra {
    fn initialize_default_values(&mut self) {
        unset_or_value(&mut self.alter_id, 0);
        unset_or_value(&mut self.experimental_authenticated_length, false);
        unset_or_value(&mut self.experimental_no_termination_signal, false);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardProtocol {
    Vmess(VmessExtra),
    Vless,
}

impl StandardProtocol {
    fn default_encryption(&self) -> &'static str {
        match self {
            StandardProtocol::Vmess(_) => "auto",
            StandardProtocol::Vless => "none",
        }
    }
}

/// A VMess or VLESS profile: endpoint, transport block and protocol tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardProfile {
    pub base: ProfileBase,
    pub stream: StreamSettings,
    pub protocol: StandardProtocol,
}

impl StandardProfile {
    pub fn vmess() -> Self {
        Self {
            base: ProfileBase::default(),
            stream: StreamSettings::default(),
            protocol: StandardProtocol::Vmess(VmessExtra::default()),
        }
    }

    pub fn vless() -> Self {
        Self {
            base: ProfileBase::default(),
            stream: StreamSettings::default(),
            protocol: StandardProtocol::Vless,
        }
    }

    pub fn vmess_extra(&self) -> Option<&VmessExtra> {
        match &self.protocol {
            StandardProtocol::Vmess(extra) => Some(extra),
            StandardProtocol::Vless => None,
        }
    }

    pub fn initialize_default_values(&mut self) {
        self.base.initialize_default_values();
        let encryption = self.protocol.default_encryption();
        self.stream.initialize_default_values(encryption, "");
        if let StandardProtocol::Vmess(extra) = &mut self.protocol {
            extra.initialize_default_values();
        }
    }

    pub fn apply_feature_settings(&self, other: &mut StandardProfile) {
        other.stream.ws_use_browser_forwarder = self.stream.ws_use_browser_forwarder;
        other.stream.allow_insecure = self.stream.allow_insecure;
    }
}
