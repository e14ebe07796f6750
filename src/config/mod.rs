// ABOUTME: Configuration types and parsing for capstan.yml.
// ABOUTME: Lifecycle bundles, image delivery, credential broker and retention settings.

mod env_value;
mod init;

pub use env_value::EnvValue;
pub use init::init_config;

use crate::error::{Error, Result};
use crate::scheduler::{ImageDeliveryMode, LifecycleBundles, SchedulerSettings};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

pub const CONFIG_FILENAME: &str = "capstan.yml";
pub const CONFIG_FILENAME_ALT: &str = "capstan.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".capstan/config.yml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// `buildpack/<stack>` or `docker` to a bundle path or URI.
    #[serde(default)]
    pub lifecycle_bundles: BTreeMap<String, String>,

    #[serde(default)]
    pub file_server_url: Option<String>,

    #[serde(default)]
    pub image_delivery_mode: ImageDeliveryMode,

    #[serde(default = "default_app_port")]
    pub default_app_port: u16,

    #[serde(default)]
    pub credhub_api: Option<CredhubApiConfig>,

    #[serde(default)]
    pub credential_references: CredentialReferencesConfig,

    #[serde(default)]
    pub deployments: DeploymentsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CredhubApiConfig {
    pub internal_url: EnvValue,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CredentialReferencesConfig {
    #[serde(default)]
    pub interpolate_service_bindings: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeploymentsConfig {
    #[serde(default = "default_max_retained")]
    pub max_retained_per_app: usize,
}

impl Default for DeploymentsConfig {
    fn default() -> Self {
        Self {
            max_retained_per_app: default_max_retained(),
        }
    }
}

fn default_app_port() -> u16 {
    8080
}

fn default_max_retained() -> usize {
    100
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// The file server base URL, validated.
    pub fn file_server_url(&self) -> Result<Option<Url>> {
        self.file_server_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw)
                    .map_err(|e| Error::InvalidConfig(format!("file_server_url {raw}: {e}")))
            })
            .transpose()
    }

    /// Credential broker URL with environment references resolved.
    pub fn credhub_url(&self) -> Result<Option<String>> {
        self.credhub_api
            .as_ref()
            .map(|api| api.internal_url.resolve())
            .transpose()
    }

    /// Settings for building scheduler action graphs.
    pub fn scheduler_settings(&self) -> Result<SchedulerSettings> {
        let bundles = LifecycleBundles::new(self.lifecycle_bundles.clone(), self.file_server_url()?);
        bundles
            .validate()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        Ok(SchedulerSettings {
            lifecycle_bundles: bundles,
            image_delivery_mode: self.image_delivery_mode,
            default_app_port: self.default_app_port,
            credhub_url: self.credhub_url()?,
            interpolate_service_bindings: self.credential_references.interpolate_service_bindings,
        })
    }

    pub fn template() -> Self {
        let mut lifecycle_bundles = BTreeMap::new();
        lifecycle_bundles.insert(
            "buildpack/cflinuxfs4".to_string(),
            "buildpack_app_lifecycle/buildpack_app_lifecycle.tgz".to_string(),
        );
        lifecycle_bundles.insert(
            "docker".to_string(),
            "docker_app_lifecycle/docker_app_lifecycle.tgz".to_string(),
        );

        Config {
            lifecycle_bundles,
            file_server_url: Some("http://file-server.service.cf.internal:8080".to_string()),
            image_delivery_mode: ImageDeliveryMode::Unset,
            default_app_port: default_app_port(),
            credhub_api: None,
            credential_references: CredentialReferencesConfig::default(),
            deployments: DeploymentsConfig::default(),
        }
    }
}
