// ABOUTME: Unit-of-work storage boundary for control plane records.
// ABOUTME: Every logical operation runs inside one all-or-nothing transaction.

mod memory;

pub use memory::MemoryStore;

use crate::model::{
    App, Deployment, Droplet, HistoricalRelatedProcess, Process, Revision, RouteMapping,
};
use crate::types::{AppGuid, DeploymentGuid, DropletGuid, ProcessGuid};

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("app not found: {0}")]
    AppNotFound(String),

    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),

    #[error("record already exists: {0}")]
    Duplicate(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Repository operations visible inside a transaction.
///
/// Listing methods return rows ordered by creation time, oldest first, with
/// insertion order breaking ties.
pub trait Transaction {
    fn app(&self, guid: &AppGuid) -> Result<App, StoreError>;
    fn app_guids(&self) -> Result<Vec<AppGuid>, StoreError>;
    fn insert_app(&mut self, app: App) -> Result<(), StoreError>;
    fn update_app(&mut self, app: &App) -> Result<(), StoreError>;

    fn droplet(&self, guid: &DropletGuid) -> Result<Option<Droplet>, StoreError>;
    fn insert_droplet(&mut self, droplet: Droplet) -> Result<(), StoreError>;

    fn revisions_for_app(&self, app: &AppGuid) -> Result<Vec<Revision>, StoreError>;
    fn insert_revision(&mut self, revision: Revision) -> Result<(), StoreError>;

    fn process(&self, guid: &ProcessGuid) -> Result<Option<Process>, StoreError>;
    fn processes_for_app(&self, app: &AppGuid) -> Result<Vec<Process>, StoreError>;
    fn insert_process(&mut self, process: Process) -> Result<(), StoreError>;

    fn route_mappings_for_process(
        &self,
        process: &ProcessGuid,
    ) -> Result<Vec<RouteMapping>, StoreError>;
    fn insert_route_mapping(&mut self, mapping: RouteMapping) -> Result<(), StoreError>;

    fn deployment(&self, guid: &DeploymentGuid) -> Result<Option<Deployment>, StoreError>;
    fn deployments_for_app(&self, app: &AppGuid) -> Result<Vec<Deployment>, StoreError>;
    fn insert_deployment(&mut self, deployment: Deployment) -> Result<(), StoreError>;
    fn update_deployment(&mut self, deployment: &Deployment) -> Result<(), StoreError>;
    /// Delete a deployment together with its historical related processes.
    fn delete_deployment(&mut self, guid: &DeploymentGuid) -> Result<(), StoreError>;

    fn historical_related_processes(
        &self,
        deployment: &DeploymentGuid,
    ) -> Result<Vec<HistoricalRelatedProcess>, StoreError>;
    fn insert_historical_related_process(
        &mut self,
        record: HistoricalRelatedProcess,
    ) -> Result<(), StoreError>;
}

/// A backend able to run transactions.
///
/// Implementations must make the closure's writes visible to other
/// transactions only if it returns `Ok`, and must serialize transactions that
/// touch the same application.
pub trait Store: Send + Sync {
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>;
}
