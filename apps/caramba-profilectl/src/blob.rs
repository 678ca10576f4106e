use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How encoded profiles are written on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobEncoding {
    #[default]
    Base64,
    Hex,
}

impl FromStr for BlobEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base64" | "b64" => Ok(Self::Base64),
            "hex" => Ok(Self::Hex),
            other => bail!("unknown blob encoding '{}'", other),
        }
    }
}

impl BlobEncoding {
    pub fn decode(self, text: &str) -> Result<Vec<u8>> {
        let text: String = text.split_whitespace().collect();
        match self {
            Self::Base64 => STANDARD.decode(&text).context("blob is not valid base64"),
            Self::Hex => hex::decode(&text).context("blob is not valid hex"),
        }
    }

    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Self::Base64 => STANDARD.encode(bytes),
            Self::Hex => hex::encode(bytes),
        }
    }
}
