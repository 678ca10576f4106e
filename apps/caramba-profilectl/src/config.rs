use anyhow::{Context, Result};
use caramba_profile::DecodeOptions;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::blob::BlobEncoding;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    #[serde(flatten)]
    pub decode: DecodeOptions,
    pub blob_encoding: BlobEncoding,
}

impl ToolConfig {
    pub fn load() -> Result<Self> {
        let config_paths = ["/etc/caramba/profiles.toml", "./profiles.toml"];

        for path in config_paths {
            if let Ok(contents) = fs::read_to_string(path) {
                tracing::debug!("Loading config from {}", path);
                return toml::from_str(&contents).with_context(|| format!("parsing {}", path));
            }
        }

        tracing::debug!("Loading config from environment");
        Self::from_env()
    }

    fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("PROFILE_STRICT_DISCRIMINATORS") {
            config.decode.strict_discriminators = parse_flag(&v)
                .with_context(|| format!("PROFILE_STRICT_DISCRIMINATORS={}", v))?;
        }
        if let Ok(v) = std::env::var("PROFILE_MAX_STRING_LEN") {
            config.decode.max_string_len = v
                .parse()
                .with_context(|| format!("PROFILE_MAX_STRING_LEN={}", v))?;
        }
        if let Ok(v) = std::env::var("PROFILE_BLOB_ENCODING") {
            config.blob_encoding = v.parse()?;
        }
        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{}'", other),
    }
}
