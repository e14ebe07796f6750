// ABOUTME: Execution metadata recorded when a container image is staged.
// ABOUTME: Declared ports and the image's configured user.

use serde::Deserialize;
use serde::de::{self, Deserializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("invalid execution metadata: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortSpec {
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    #[serde(default)]
    pub protocol: String,
}

impl PortSpec {
    pub fn is_tcp(&self) -> bool {
        self.protocol == "tcp"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecutionMetadata {
    /// `None` when the image declares no ports at all.
    #[serde(default)]
    pub ports: Option<Vec<PortSpec>>,
    #[serde(default)]
    pub user: Option<String>,
}

impl ExecutionMetadata {
    /// Parse the JSON document. An empty document means no metadata.
    pub fn parse(raw: &str) -> Result<Self, MetadataError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }
}

// Image metadata records ports as strings ("8080") or numbers.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u16),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid port: {s}"))),
    }
}
