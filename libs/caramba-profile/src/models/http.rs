use serde::{Deserialize, Serialize};

use super::ProfileBase;
use crate::normalize::{unset_or, unset_or_value};

/// HTTP(S) proxy profile. The TLS block is only meaningful when `tls` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpProfile {
    pub base: ProfileBase,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
    pub sni: Option<String>,
    pub alpn: Option<String>,
    pub certificates: Option<String>,
    pub pinned_peer_cert_sha256: Option<String>,
    pub allow_insecure: Option<bool>,
}

impl HttpProfile {
    pub fn initialize_default_values(&mut self) {
        self.base.initialize_default_values();
        unset_or(&mut self.username, "");
        unset_or(&mut self.password, "");
        unset_or(&mut self.sni, "");
        unset_or(&mut self.alpn, "");
        unset_or(&mut self.certificates, "");
        unset_or(&mut self.pinned_peer_cert_sha256, "");
        unset_or_value(&mut self.allow_insecure, false);
    }

    pub fn apply_feature_settings(&self, other: &mut HttpProfile) {
        other.allow_insecure = self.allow_insecure;
    }
}
