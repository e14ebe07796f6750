// ABOUTME: Picks the strongest available digest for a droplet download.
// ABOUTME: SHA-256 when present, the legacy SHA-1 hash otherwise.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Sha256,
    Sha1,
}

impl ChecksumAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Sha1 => "sha1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub value: String,
}

impl Checksum {
    /// Strong enough to identify an image layer.
    pub fn is_strong(&self) -> bool {
        self.algorithm == ChecksumAlgorithm::Sha256
    }
}

/// Choose the digest used to verify a droplet.
///
/// Droplets staged before SHA-256 was computed only carry the legacy hash.
/// Returns `None` when neither is known.
pub fn select_checksum(sha256: Option<&str>, legacy_sha1: Option<&str>) -> Option<Checksum> {
    let present = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(value) = present(sha256) {
        return Some(Checksum {
            algorithm: ChecksumAlgorithm::Sha256,
            value,
        });
    }

    present(legacy_sha1).map(|value| Checksum {
        algorithm: ChecksumAlgorithm::Sha1,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_sha256() {
        let checksum = select_checksum(Some("abc256"), Some("abc1")).unwrap();
        assert_eq!(checksum.algorithm, ChecksumAlgorithm::Sha256);
        assert_eq!(checksum.value, "abc256");
        assert!(checksum.is_strong());
    }

    #[test]
    fn falls_back_to_legacy_hash() {
        let checksum = select_checksum(None, Some("abc1")).unwrap();
        assert_eq!(checksum.algorithm, ChecksumAlgorithm::Sha1);
        assert!(!checksum.is_strong());
    }

    #[test]
    fn empty_sha256_counts_as_missing() {
        let checksum = select_checksum(Some(""), Some("abc1")).unwrap();
        assert_eq!(checksum.algorithm, ChecksumAlgorithm::Sha1);
    }

    #[test]
    fn none_without_any_digest() {
        assert!(select_checksum(None, None).is_none());
    }
}
