// ABOUTME: In-memory store with snapshot transactions.
// ABOUTME: Writes land on a private copy and replace the shared tables only on commit.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::model::{
    App, Deployment, Droplet, HistoricalRelatedProcess, Process, Revision, RouteMapping,
};
use crate::types::{AppGuid, DeploymentGuid, DropletGuid, ProcessGuid};

use super::{Store, StoreError, Transaction};

#[derive(Debug, Clone, Default)]
struct Tables {
    apps: Vec<App>,
    droplets: Vec<Droplet>,
    revisions: Vec<Revision>,
    processes: Vec<Process>,
    route_mappings: Vec<RouteMapping>,
    deployments: Vec<Deployment>,
    historical_processes: Vec<HistoricalRelatedProcess>,
}

/// In-memory store for tests and local planning.
///
/// A single lock is held for the whole transaction, so transactions are
/// fully serialized. Data is lost when the process exits.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backing database going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Store for MemoryStore {
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store disabled".to_string()).into());
        }

        let mut tables = self.tables.lock();
        let mut tx = MemoryTransaction {
            tables: tables.clone(),
        };

        let value = f(&mut tx)?;
        *tables = tx.tables;
        Ok(value)
    }
}

struct MemoryTransaction {
    tables: Tables,
}

fn sorted_by_creation<T: Clone>(
    rows: impl Iterator<Item = T>,
    created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>,
) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    // Stable: insertion order breaks ties.
    rows.sort_by_key(|row| created_at(row));
    rows
}

impl Transaction for MemoryTransaction {
    fn app(&self, guid: &AppGuid) -> Result<App, StoreError> {
        self.tables
            .apps
            .iter()
            .find(|a| &a.guid == guid)
            .cloned()
            .ok_or_else(|| StoreError::AppNotFound(guid.to_string()))
    }

    fn app_guids(&self) -> Result<Vec<AppGuid>, StoreError> {
        Ok(self.tables.apps.iter().map(|a| a.guid.clone()).collect())
    }

    fn insert_app(&mut self, app: App) -> Result<(), StoreError> {
        if self.tables.apps.iter().any(|a| a.guid == app.guid) {
            return Err(StoreError::Duplicate(format!("app {}", app.guid)));
        }
        self.tables.apps.push(app);
        Ok(())
    }

    fn update_app(&mut self, app: &App) -> Result<(), StoreError> {
        let row = self
            .tables
            .apps
            .iter_mut()
            .find(|a| a.guid == app.guid)
            .ok_or_else(|| StoreError::AppNotFound(app.guid.to_string()))?;
        *row = app.clone();
        Ok(())
    }

    fn droplet(&self, guid: &DropletGuid) -> Result<Option<Droplet>, StoreError> {
        Ok(self
            .tables
            .droplets
            .iter()
            .find(|d| &d.guid == guid)
            .cloned())
    }

    fn insert_droplet(&mut self, droplet: Droplet) -> Result<(), StoreError> {
        if self.tables.droplets.iter().any(|d| d.guid == droplet.guid) {
            return Err(StoreError::Duplicate(format!("droplet {}", droplet.guid)));
        }
        self.tables.droplets.push(droplet);
        Ok(())
    }

    fn revisions_for_app(&self, app: &AppGuid) -> Result<Vec<Revision>, StoreError> {
        Ok(sorted_by_creation(
            self.tables
                .revisions
                .iter()
                .filter(|r| &r.app == app)
                .cloned(),
            |r| r.created_at,
        ))
    }

    fn insert_revision(&mut self, revision: Revision) -> Result<(), StoreError> {
        if self.tables.revisions.iter().any(|r| r.guid == revision.guid) {
            return Err(StoreError::Duplicate(format!("revision {}", revision.guid)));
        }
        self.tables.revisions.push(revision);
        Ok(())
    }

    fn process(&self, guid: &ProcessGuid) -> Result<Option<Process>, StoreError> {
        Ok(self
            .tables
            .processes
            .iter()
            .find(|p| &p.guid == guid)
            .cloned())
    }

    fn processes_for_app(&self, app: &AppGuid) -> Result<Vec<Process>, StoreError> {
        Ok(sorted_by_creation(
            self.tables
                .processes
                .iter()
                .filter(|p| &p.app == app)
                .cloned(),
            |p| p.created_at,
        ))
    }

    fn insert_process(&mut self, process: Process) -> Result<(), StoreError> {
        if self.tables.processes.iter().any(|p| p.guid == process.guid) {
            return Err(StoreError::Duplicate(format!("process {}", process.guid)));
        }
        self.tables.processes.push(process);
        Ok(())
    }

    fn route_mappings_for_process(
        &self,
        process: &ProcessGuid,
    ) -> Result<Vec<RouteMapping>, StoreError> {
        Ok(sorted_by_creation(
            self.tables
                .route_mappings
                .iter()
                .filter(|m| &m.process == process)
                .cloned(),
            |m| m.created_at,
        ))
    }

    fn insert_route_mapping(&mut self, mapping: RouteMapping) -> Result<(), StoreError> {
        if self
            .tables
            .route_mappings
            .iter()
            .any(|m| {
                m.guid == mapping.guid || (m.route == mapping.route && m.process == mapping.process)
            })
        {
            return Err(StoreError::Duplicate(format!(
                "route mapping {} -> {}",
                mapping.route, mapping.process
            )));
        }
        self.tables.route_mappings.push(mapping);
        Ok(())
    }

    fn deployment(&self, guid: &DeploymentGuid) -> Result<Option<Deployment>, StoreError> {
        Ok(self
            .tables
            .deployments
            .iter()
            .find(|d| &d.guid == guid)
            .cloned())
    }

    fn deployments_for_app(&self, app: &AppGuid) -> Result<Vec<Deployment>, StoreError> {
        Ok(sorted_by_creation(
            self.tables
                .deployments
                .iter()
                .filter(|d| &d.app == app)
                .cloned(),
            |d| d.created_at,
        ))
    }

    fn insert_deployment(&mut self, deployment: Deployment) -> Result<(), StoreError> {
        if self
            .tables
            .deployments
            .iter()
            .any(|d| d.guid == deployment.guid)
        {
            return Err(StoreError::Duplicate(format!(
                "deployment {}",
                deployment.guid
            )));
        }
        self.tables.deployments.push(deployment);
        Ok(())
    }

    fn update_deployment(&mut self, deployment: &Deployment) -> Result<(), StoreError> {
        let row = self
            .tables
            .deployments
            .iter_mut()
            .find(|d| d.guid == deployment.guid)
            .ok_or_else(|| StoreError::DeploymentNotFound(deployment.guid.to_string()))?;
        *row = deployment.clone();
        Ok(())
    }

    fn delete_deployment(&mut self, guid: &DeploymentGuid) -> Result<(), StoreError> {
        let before = self.tables.deployments.len();
        self.tables.deployments.retain(|d| &d.guid != guid);
        if self.tables.deployments.len() == before {
            return Err(StoreError::DeploymentNotFound(guid.to_string()));
        }

        self.tables
            .historical_processes
            .retain(|h| &h.deployment != guid);
        Ok(())
    }

    fn historical_related_processes(
        &self,
        deployment: &DeploymentGuid,
    ) -> Result<Vec<HistoricalRelatedProcess>, StoreError> {
        Ok(self
            .tables
            .historical_processes
            .iter()
            .filter(|h| &h.deployment == deployment)
            .cloned()
            .collect())
    }

    fn insert_historical_related_process(
        &mut self,
        record: HistoricalRelatedProcess,
    ) -> Result<(), StoreError> {
        if !self
            .tables
            .deployments
            .iter()
            .any(|d| d.guid == record.deployment)
        {
            return Err(StoreError::DeploymentNotFound(record.deployment.to_string()));
        }
        self.tables.historical_processes.push(record);
        Ok(())
    }
}
