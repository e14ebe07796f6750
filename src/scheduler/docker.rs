// ABOUTME: Action graph for long-running processes backed by a container image.
// ABOUTME: Resolves the rootfs, run user, ports and the port environment.

use serde::{Deserialize, Deserializer};

use crate::types::ImageRef;

use super::actions::{
    Action, CachedDependency, DownloadAction, EnvironmentVariable, ImageLayer, ResourceLimits,
    RunAction,
};
use super::builder::{ActionBuilder, SchedulerSettings};
use super::delivery::Delivery;
use super::error::ActionGraphError;
use super::lifecycle::{LAUNCHER_PATH, LIFECYCLE_DESTINATION, LifecycleType};
use super::metadata::ExecutionMetadata;
use super::ports::{PortError, resolve_ports};

const DEFAULT_USER: &str = "root";
const LOG_SOURCE: &str = "APP/PROC/WEB";
const IMAGE_LAYER: &str = "docker-image";

/// A web process running a container image.
#[derive(Debug, Clone, Deserialize)]
pub struct LrpSpec {
    #[serde(deserialize_with = "deserialize_image_ref")]
    pub docker_image: ImageRef,
    pub start_command: String,
    /// JSON recorded when the image was staged.
    #[serde(default)]
    pub execution_metadata: String,
    /// Ports configured on the process. Empty means "ask the image".
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub file_descriptors: Option<u64>,
    #[serde(default)]
    pub environment: Vec<EnvironmentVariable>,
}

pub struct DockerLrpActionBuilder<'a> {
    settings: &'a SchedulerSettings,
    lrp: &'a LrpSpec,
    metadata: ExecutionMetadata,
    delivery: Delivery,
}

impl<'a> DockerLrpActionBuilder<'a> {
    /// Fails if the execution metadata is not valid JSON.
    pub fn new(settings: &'a SchedulerSettings, lrp: &'a LrpSpec) -> Result<Self, ActionGraphError> {
        let metadata = ExecutionMetadata::parse(&lrp.execution_metadata)?;

        // Image digests are checked by the registry pull, never by a droplet hash.
        let delivery = Delivery::select(settings.image_delivery_mode, true);

        Ok(Self {
            settings,
            lrp,
            metadata,
            delivery,
        })
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    pub fn root_fs(&self) -> String {
        self.lrp.docker_image.to_docker_uri()
    }

    pub fn action_user(&self) -> &str {
        self.metadata
            .user
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_USER)
    }

    pub fn ports(&self) -> Result<Vec<u16>, PortError> {
        resolve_ports(&self.lrp.ports, &self.metadata, self.settings.default_app_port)
    }

    /// `PORT` set to the primary port.
    pub fn port_environment_variables(&self) -> Result<Vec<EnvironmentVariable>, PortError> {
        Ok(self
            .ports()?
            .first()
            .map(|port| EnvironmentVariable::new("PORT", port.to_string()))
            .into_iter()
            .collect())
    }

    fn lifecycle_uri(&self) -> Result<String, ActionGraphError> {
        Ok(self
            .settings
            .lifecycle_bundles
            .resolve(LifecycleType::Docker, None)?)
    }
}

impl ActionBuilder for DockerLrpActionBuilder<'_> {
    fn action(&self) -> Result<Action, ActionGraphError> {
        let run = Action::Run(RunAction {
            path: LAUNCHER_PATH.to_string(),
            args: vec![
                "app".to_string(),
                self.lrp.start_command.clone(),
                self.lrp.execution_metadata.clone(),
            ],
            log_source: LOG_SOURCE.to_string(),
            user: self.action_user().to_string(),
            resource_limits: ResourceLimits {
                nofile: self.lrp.file_descriptors,
            },
            env: self.environment_variables()?,
        });

        Ok(match self.delivery {
            Delivery::Layered => run,
            Delivery::Download => {
                let download = DownloadAction {
                    from: self.root_fs(),
                    to: ".".to_string(),
                    cache_key: String::new(),
                    user: self.action_user().to_string(),
                    checksum_algorithm: None,
                    checksum_value: None,
                };
                Action::serial(vec![Action::Download(download), run])
            }
        })
    }

    fn image_layers(&self) -> Result<Option<Vec<ImageLayer>>, ActionGraphError> {
        if self.delivery == Delivery::Download {
            return Ok(None);
        }

        let lifecycle = ImageLayer::shared(
            LifecycleType::Docker.cache_key(None),
            self.lifecycle_uri()?,
            LIFECYCLE_DESTINATION,
        );
        let image = ImageLayer::exclusive(IMAGE_LAYER, self.root_fs(), "/")
            .with_sha256(self.lrp.docker_image.sha256_digest());

        Ok(Some(vec![lifecycle, image]))
    }

    fn cached_dependencies(&self) -> Result<Option<Vec<CachedDependency>>, ActionGraphError> {
        if self.delivery == Delivery::Layered {
            return Ok(None);
        }

        Ok(Some(vec![CachedDependency {
            from: self.lifecycle_uri()?,
            to: LIFECYCLE_DESTINATION.to_string(),
            cache_key: LifecycleType::Docker.cache_key(None),
        }]))
    }

    fn environment_variables(&self) -> Result<Vec<EnvironmentVariable>, ActionGraphError> {
        let mut env = self.lrp.environment.clone();
        env.extend(self.port_environment_variables()?);
        env.extend(self.settings.platform_options());
        Ok(env)
    }
}

fn deserialize_image_ref<'de, D>(deserializer: D) -> Result<ImageRef, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}
