use serde::{Deserialize, Serialize};

use super::{ProfileBase, StreamSettings};
use crate::normalize::unset_or;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrojanProfile {
    pub base: ProfileBase,
    pub stream: StreamSettings,
    pub password: Option<String>,
}

impl TrojanProfile {
    pub fn initialize_default_values(&mut self) {
        self.base.initialize_default_values();
        // blank security means tls
        self.stream.initialize_default_values("", "tls");
        unset_or(&mut self.password, "");
    }

    pub fn apply_feature_settings(&self, other: &mut TrojanProfile) {
        other.stream.allow_insecure = self.stream.allow_insecure;
    }
}
