// ABOUTME: Translates workloads into action graphs for the external scheduler.
// ABOUTME: Buildpack tasks and container-image LRPs, in download or layered delivery.

mod actions;
mod builder;
mod buildpack;
mod checksum;
mod delivery;
mod docker;
mod error;
mod lifecycle;
mod metadata;
mod ports;

pub use actions::{
    Action, ActionGraph, CachedDependency, DigestAlgorithm, DownloadAction, EnvironmentVariable,
    ImageLayer, LayerType, MediaType, ResourceLimits, RunAction,
};
pub use builder::{ActionBuilder, PLATFORM_OPTIONS_VAR, SchedulerSettings};
pub use buildpack::{BuildpackTaskActionBuilder, TaskEnvironment, TaskSpec};
pub use checksum::{Checksum, ChecksumAlgorithm, select_checksum};
pub use delivery::{Delivery, ImageDeliveryMode};
pub use docker::{DockerLrpActionBuilder, LrpSpec};
pub use error::{ActionGraphError, ActionGraphErrorKind};
pub use lifecycle::{
    LAUNCHER_PATH, LIFECYCLE_DESTINATION, LifecycleBundles, LifecycleError, LifecycleType,
};
pub use metadata::{ExecutionMetadata, MetadataError, PortSpec};
pub use ports::{PortError, resolve_ports};
