// ABOUTME: Wire model consumed by the external workload scheduler.
// ABOUTME: Actions, cached dependencies, image layers and environment variables.

use serde::{Deserialize, Serialize};

use super::checksum::{Checksum, ChecksumAlgorithm};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nofile: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadAction {
    pub from: String,
    pub to: String,
    pub cache_key: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_algorithm: Option<ChecksumAlgorithm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_value: Option<String>,
}

impl DownloadAction {
    /// Attach an integrity check to the download.
    pub fn with_checksum(mut self, checksum: Option<&Checksum>) -> Self {
        self.checksum_algorithm = checksum.map(|c| c.algorithm);
        self.checksum_value = checksum.map(|c| c.value.clone());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAction {
    pub path: String,
    pub args: Vec<String>,
    pub log_source: String,
    pub user: String,
    pub resource_limits: ResourceLimits,
    pub env: Vec<EnvironmentVariable>,
}

/// A scheduler step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Steps executed in order, stopping at the first failure.
    #[serde(rename = "serial_action")]
    Serial { actions: Vec<Action> },
    #[serde(rename = "download_action")]
    Download(DownloadAction),
    #[serde(rename = "run_action")]
    Run(RunAction),
}

impl Action {
    pub fn serial(actions: Vec<Action>) -> Self {
        Action::Serial { actions }
    }

    /// The top-level steps: the children of a serial action, or the action itself.
    pub fn steps(&self) -> Vec<&Action> {
        match self {
            Action::Serial { actions } => actions.iter().collect(),
            other => vec![other],
        }
    }

    pub fn as_download(&self) -> Option<&DownloadAction> {
        match self {
            Action::Download(download) => Some(download),
            _ => None,
        }
    }

    pub fn as_run(&self) -> Option<&RunAction> {
        match self {
            Action::Run(run) => Some(run),
            _ => None,
        }
    }
}

/// A file the scheduler fetches once per cell and shares between containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDependency {
    pub from: String,
    pub to: String,
    pub cache_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerType {
    /// Reusable by every workload on the same stack.
    Shared,
    /// Belongs to a single workload.
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Tgz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DigestAlgorithm {
    Sha256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLayer {
    pub name: String,
    pub url: String,
    pub destination_path: String,
    pub layer_type: LayerType,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<DigestAlgorithm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_value: Option<String>,
}

impl ImageLayer {
    pub fn shared(name: impl Into<String>, url: impl Into<String>, destination: &str) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            destination_path: destination.to_string(),
            layer_type: LayerType::Shared,
            media_type: MediaType::Tgz,
            digest_algorithm: None,
            digest_value: None,
        }
    }

    pub fn exclusive(name: impl Into<String>, url: impl Into<String>, destination: &str) -> Self {
        Self {
            layer_type: LayerType::Exclusive,
            ..Self::shared(name, url, destination)
        }
    }

    /// Attach a SHA-256 digest. Layers only accept strong digests.
    pub fn with_sha256(mut self, digest: Option<&str>) -> Self {
        self.digest_algorithm = digest.map(|_| DigestAlgorithm::Sha256);
        self.digest_value = digest.map(str::to_string);
        self
    }
}

/// Everything the scheduler needs to run one workload submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGraph {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_layers: Option<Vec<ImageLayer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_dependencies: Option<Vec<CachedDependency>>,
    pub environment_variables: Vec<EnvironmentVariable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_action_serializes_with_wire_names() {
        let action = Action::serial(vec![Action::Run(RunAction {
            path: "/tmp/lifecycle/launcher".to_string(),
            args: vec![],
            log_source: "APP/TASK/t".to_string(),
            user: "vcap".to_string(),
            resource_limits: ResourceLimits::default(),
            env: vec![],
        })]);

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json["serial_action"]["actions"][0]["run_action"]["user"],
            "vcap"
        );
    }

    #[test]
    fn steps_flattens_one_level() {
        let run = Action::Run(RunAction {
            path: "p".to_string(),
            args: vec![],
            log_source: "l".to_string(),
            user: "u".to_string(),
            resource_limits: ResourceLimits::default(),
            env: vec![],
        });
        assert_eq!(run.steps().len(), 1);
        assert_eq!(Action::serial(vec![run.clone(), run]).steps().len(), 2);
    }

    #[test]
    fn layer_enums_use_screaming_case() {
        let layer = ImageLayer::exclusive("droplet", "http://x", "/home/vcap").with_sha256(Some("abc"));
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["layer_type"], "EXCLUSIVE");
        assert_eq!(json["media_type"], "TGZ");
        assert_eq!(json["digest_algorithm"], "SHA256");
    }
}
