// ABOUTME: Retention sweep for deployment history.
// ABOUTME: Deletes each app's oldest finished deployments beyond a per-app cap.

use std::sync::Arc;

use tracing::info;

use crate::config::DeploymentsConfig;
use crate::store::{Store, StoreError, Transaction};
use crate::types::AppGuid;

/// Prunes deployment history, one app per transaction.
pub struct DeploymentPruner<S> {
    store: Arc<S>,
}

impl<S: Store> DeploymentPruner<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Prune one app's deployments down to `retention_limit`.
    ///
    /// Returns the number of deployments deleted.
    pub fn prune(&self, app: &AppGuid, retention_limit: usize) -> Result<usize, StoreError> {
        let deleted = self
            .store
            .transaction(|tx| prune_app(tx, app, retention_limit))?;

        if deleted > 0 {
            info!(app = %app, deleted, retention_limit, "pruned aged deployments");
        }
        Ok(deleted)
    }

    /// Prune every app independently.
    ///
    /// A failure on one app stops the sweep; apps already pruned stay pruned.
    pub fn prune_all(&self, retention_limit: usize) -> Result<usize, StoreError> {
        let apps = self.store.transaction(|tx| tx.app_guids())?;

        let mut total = 0;
        for app in &apps {
            total += self.prune(app, retention_limit)?;
        }
        Ok(total)
    }

    /// Prune every app down to the configured `max_retained_per_app`.
    pub fn prune_configured(&self, config: &DeploymentsConfig) -> Result<usize, StoreError> {
        self.prune_all(config.max_retained_per_app)
    }
}

/// Delete the oldest prunable deployments of `app` until at most
/// `retention_limit` remain or only protected ones are left over the cap.
pub fn prune_app(
    tx: &mut dyn Transaction,
    app: &AppGuid,
    retention_limit: usize,
) -> Result<usize, StoreError> {
    let deployments = tx.deployments_for_app(app)?;
    let excess = deployments.len().saturating_sub(retention_limit);

    let doomed: Vec<_> = deployments
        .into_iter()
        .filter(|d| d.state.is_prunable())
        .take(excess)
        .map(|d| d.guid)
        .collect();

    for guid in &doomed {
        tx.delete_deployment(guid)?;
    }
    Ok(doomed.len())
}
