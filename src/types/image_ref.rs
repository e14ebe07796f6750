// ABOUTME: Container image reference parsing and docker URI conversion.
// ABOUTME: Handles formats like redis, user/repo:tag, registry:5000/image:tag@digest.

use std::fmt;
use thiserror::Error;

const OFFICIAL_REGISTRY: &str = "docker.io";

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("docker image reference [{0}] should not contain a scheme")]
    HasScheme(String),

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("invalid image reference format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if input.contains("://") {
            return Err(ParseImageRefError::HasScheme(input.to_string()));
        }

        for c in input.chars() {
            if !c.is_ascii_alphanumeric()
                && c != '/'
                && c != ':'
                && c != '.'
                && c != '-'
                && c != '_'
                && c != '@'
            {
                return Err(ParseImageRefError::InvalidChar(c));
            }
        }

        let (without_digest, digest) = match input.split_once('@') {
            Some((before, after)) if !after.is_empty() => (before, Some(after.to_string())),
            Some(_) => return Err(ParseImageRefError::InvalidFormat(input.to_string())),
            None => (input, None),
        };

        // A colon followed by a slash belongs to a registry port, not a tag.
        let (without_tag, tag) = match without_digest.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => (before, Some(after.to_string())),
            _ => (without_digest, None),
        };

        let (registry, name) = Self::parse_registry_and_name(without_tag)?;

        let tag = match (&tag, &digest) {
            (None, None) => Some("latest".to_string()),
            _ => tag,
        };

        Ok(Self {
            registry,
            name,
            tag,
            digest,
        })
    }

    fn parse_registry_and_name(
        input: &str,
    ) -> Result<(Option<String>, String), ParseImageRefError> {
        if input.is_empty() || input.ends_with('/') {
            return Err(ParseImageRefError::InvalidFormat(input.to_string()));
        }

        // The first component is a registry when it looks like a host.
        match input.split_once('/') {
            None => Ok((None, input.to_string())),
            Some((first, rest)) => {
                if first.contains('.') || first.contains(':') || first == "localhost" {
                    Ok((Some(first.to_string()), rest.to_string()))
                } else {
                    Ok((None, input.to_string()))
                }
            }
        }
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// The hex value of a `sha256:` digest, if the reference is pinned by one.
    pub fn sha256_digest(&self) -> Option<&str> {
        self.digest
            .as_deref()
            .and_then(|d| d.strip_prefix("sha256:"))
            .filter(|hex| !hex.is_empty())
    }

    /// Convert to the `docker://host/path#fragment` form the scheduler uses as a rootfs.
    ///
    /// Images without a registry (and images on the official registry) that have
    /// no namespace are placed under `library/`. The fragment is the digest when
    /// pinned, otherwise the tag.
    pub fn to_docker_uri(&self) -> String {
        let host = self.registry.as_deref().unwrap_or("");
        let official = self.registry.is_none() || host == OFFICIAL_REGISTRY;

        let path = if official && !self.name.contains('/') {
            format!("library/{}", self.name)
        } else {
            self.name.clone()
        };

        let fragment = self
            .digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or("latest");

        format!("docker://{host}/{path}#{fragment}")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}
