// ABOUTME: Action graph for one-off tasks running a buildpack-staged droplet.
// ABOUTME: Downloads the droplet or mounts it as a layer depending on delivery.

use serde::Deserialize;
use tracing::debug;

use crate::model::Droplet;

use super::actions::{
    Action, CachedDependency, DownloadAction, EnvironmentVariable, ImageLayer, ResourceLimits,
    RunAction,
};
use super::builder::{ActionBuilder, SchedulerSettings};
use super::checksum::{Checksum, select_checksum};
use super::delivery::Delivery;
use super::error::ActionGraphError;
use super::lifecycle::{LAUNCHER_PATH, LIFECYCLE_DESTINATION, LifecycleType};

const TASK_USER: &str = "vcap";
const DROPLET_LAYER: &str = "droplet";
const DROPLET_DESTINATION: &str = "/home/vcap";

/// A task to run against a staged droplet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub command: String,
    pub droplet_uri: String,
    pub stack: String,
    #[serde(default)]
    pub sha256_checksum: Option<String>,
    /// Legacy SHA-1 droplet hash.
    #[serde(default)]
    pub droplet_hash: Option<String>,
}

impl TaskSpec {
    /// A task against `droplet`, served from `droplet_uri`.
    pub fn for_droplet(
        name: impl Into<String>,
        command: impl Into<String>,
        droplet: &Droplet,
        droplet_uri: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            droplet_uri: droplet_uri.into(),
            stack: stack.into(),
            sha256_checksum: droplet.sha256_checksum.clone(),
            droplet_hash: droplet.droplet_hash.clone(),
        }
    }

    pub fn checksum(&self) -> Option<Checksum> {
        select_checksum(self.sha256_checksum.as_deref(), self.droplet_hash.as_deref())
    }
}

/// Collects the environment a task runs with.
pub trait TaskEnvironment {
    fn for_task(&self, task: &TaskSpec) -> Vec<EnvironmentVariable>;
}

impl TaskEnvironment for [EnvironmentVariable] {
    fn for_task(&self, _task: &TaskSpec) -> Vec<EnvironmentVariable> {
        self.to_vec()
    }
}

impl TaskEnvironment for Vec<EnvironmentVariable> {
    fn for_task(&self, task: &TaskSpec) -> Vec<EnvironmentVariable> {
        self.as_slice().for_task(task)
    }
}

pub struct BuildpackTaskActionBuilder<'a> {
    settings: &'a SchedulerSettings,
    task: &'a TaskSpec,
    environment: &'a dyn TaskEnvironment,
    checksum: Option<Checksum>,
    delivery: Delivery,
}

impl<'a> BuildpackTaskActionBuilder<'a> {
    pub fn new(
        settings: &'a SchedulerSettings,
        task: &'a TaskSpec,
        environment: &'a dyn TaskEnvironment,
    ) -> Self {
        let checksum = task.checksum();
        let strong = checksum.as_ref().is_some_and(Checksum::is_strong);
        let delivery = Delivery::select(settings.image_delivery_mode, strong);

        if settings.image_delivery_mode.is_oci() && delivery == Delivery::Download {
            debug!(task = %task.name, "droplet has no sha256 digest, downloading instead of layering");
        }

        Self {
            settings,
            task,
            environment,
            checksum,
            delivery,
        }
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// Root filesystem the task runs on.
    pub fn stack(&self) -> String {
        format!("preloaded:{}", self.task.stack)
    }

    fn lifecycle_uri(&self) -> Result<String, ActionGraphError> {
        Ok(self
            .settings
            .lifecycle_bundles
            .resolve(LifecycleType::Buildpack, Some(&self.task.stack))?)
    }

    fn cache_key(&self) -> String {
        LifecycleType::Buildpack.cache_key(Some(&self.task.stack))
    }

    fn run_action(&self) -> Result<Action, ActionGraphError> {
        Ok(Action::Run(RunAction {
            path: LAUNCHER_PATH.to_string(),
            args: vec!["app".to_string(), self.task.command.clone(), String::new()],
            log_source: format!("APP/TASK/{}", self.task.name),
            user: TASK_USER.to_string(),
            resource_limits: ResourceLimits::default(),
            env: self.environment_variables()?,
        }))
    }

    fn download_droplet(&self) -> Action {
        Action::Download(
            DownloadAction {
                from: self.task.droplet_uri.clone(),
                to: ".".to_string(),
                cache_key: String::new(),
                user: TASK_USER.to_string(),
                checksum_algorithm: None,
                checksum_value: None,
            }
            .with_checksum(self.checksum.as_ref()),
        )
    }
}

impl ActionBuilder for BuildpackTaskActionBuilder<'_> {
    fn action(&self) -> Result<Action, ActionGraphError> {
        let run = self.run_action()?;
        Ok(match self.delivery {
            Delivery::Download => Action::serial(vec![self.download_droplet(), run]),
            Delivery::Layered => run,
        })
    }

    fn image_layers(&self) -> Result<Option<Vec<ImageLayer>>, ActionGraphError> {
        if self.delivery == Delivery::Download {
            return Ok(None);
        }

        let lifecycle = ImageLayer::shared(self.cache_key(), self.lifecycle_uri()?, LIFECYCLE_DESTINATION);
        let droplet = ImageLayer::exclusive(DROPLET_LAYER, &self.task.droplet_uri, DROPLET_DESTINATION)
            .with_sha256(self.checksum.as_ref().map(|c| c.value.as_str()));

        Ok(Some(vec![lifecycle, droplet]))
    }

    fn cached_dependencies(&self) -> Result<Option<Vec<CachedDependency>>, ActionGraphError> {
        if self.delivery == Delivery::Layered {
            return Ok(None);
        }

        Ok(Some(vec![CachedDependency {
            from: self.lifecycle_uri()?,
            to: LIFECYCLE_DESTINATION.to_string(),
            cache_key: self.cache_key(),
        }]))
    }

    fn environment_variables(&self) -> Result<Vec<EnvironmentVariable>, ActionGraphError> {
        Ok(self.environment.for_task(self.task))
    }
}
