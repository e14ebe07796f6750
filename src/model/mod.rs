// ABOUTME: Persisted records of the control plane.
// ABOUTME: Apps, droplets, revisions, processes, route mappings and deployments.

mod app;
mod deployment;
mod process;
mod route;

pub use app::{App, Droplet, Revision};
pub use deployment::{Deployment, DeploymentState, HistoricalRelatedProcess, RevisionRef};
pub use process::{HealthCheck, HealthCheckType, Process, ProcessState};
pub use route::RouteMapping;
