// ABOUTME: How a workload's payload reaches the container.
// ABOUTME: Download-then-run, or layered image assembly, chosen once per builder.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};

/// Platform-wide image delivery setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageDeliveryMode {
    /// Not configured. Behaves like `Download`.
    #[default]
    Unset,
    /// Explicitly configured as the empty string.
    Download,
    /// `oci-phase-1`: payloads arrive as image layers.
    OciPhase1,
}

impl ImageDeliveryMode {
    pub fn is_oci(&self) -> bool {
        matches!(self, ImageDeliveryMode::OciPhase1)
    }
}

impl FromStr for ImageDeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(ImageDeliveryMode::Download),
            "oci-phase-1" => Ok(ImageDeliveryMode::OciPhase1),
            other => Err(format!("unknown image delivery mode: {other}")),
        }
    }
}

impl fmt::Display for ImageDeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageDeliveryMode::Unset => write!(f, "unset"),
            ImageDeliveryMode::Download => write!(f, "download"),
            ImageDeliveryMode::OciPhase1 => write!(f, "oci-phase-1"),
        }
    }
}

impl<'de> Deserialize<'de> for ImageDeliveryMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(ImageDeliveryMode::Unset),
            Some(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

/// Delivery strategy a builder commits to at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Download the payload and lifecycle as a serial step, then run.
    Download,
    /// Mount lifecycle and payload as image layers; run only.
    Layered,
}

impl Delivery {
    /// Layered delivery needs a payload digest the scheduler can trust.
    /// Without one, OCI mode degrades to downloading.
    pub fn select(mode: ImageDeliveryMode, verifiable_payload: bool) -> Self {
        if mode.is_oci() && verifiable_payload {
            Delivery::Layered
        } else {
            Delivery::Download
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing() {
        assert_eq!("".parse::<ImageDeliveryMode>().unwrap(), ImageDeliveryMode::Download);
        assert_eq!(
            "oci-phase-1".parse::<ImageDeliveryMode>().unwrap(),
            ImageDeliveryMode::OciPhase1
        );
        assert!("oci-phase-2".parse::<ImageDeliveryMode>().is_err());
    }

    #[test]
    fn layered_only_in_oci_mode_with_verifiable_payload() {
        assert_eq!(Delivery::select(ImageDeliveryMode::OciPhase1, true), Delivery::Layered);
        assert_eq!(Delivery::select(ImageDeliveryMode::OciPhase1, false), Delivery::Download);
        assert_eq!(Delivery::select(ImageDeliveryMode::Unset, true), Delivery::Download);
        assert_eq!(Delivery::select(ImageDeliveryMode::Download, true), Delivery::Download);
    }
}
