// ABOUTME: Creates rolling deployments for an app in a single transaction.
// ABOUTME: Assigns the droplet, clones the web process, carries routes and supersedes old rollouts.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::audit::{AuditEvent, AuditSink, DEPLOYMENT_CREATE, UserAuditInfo};
use crate::model::{
    App, Deployment, DeploymentState, Droplet, HistoricalRelatedProcess, Process, RevisionRef,
};
use crate::store::{Store, Transaction};
use crate::types::{AppGuid, DeploymentGuid, DropletGuid};

use super::error::DeployError;
use super::replicator::ProcessReplicator;
use super::revision::{RevisionCreator, SequentialRevisions};
use super::routes::RouteCarryover;

/// Starts rollouts.
///
/// Everything `create` writes (droplet assignment, revision, deploying
/// process, route mappings, superseded deployments, history and the audit
/// record) commits together or not at all.
pub struct DeploymentCreate<S> {
    store: Arc<S>,
    audit: Arc<dyn AuditSink>,
    revisions: Arc<dyn RevisionCreator>,
}

impl<S: Store> DeploymentCreate<S> {
    pub fn new(store: Arc<S>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            audit,
            revisions: Arc::new(SequentialRevisions),
        }
    }

    /// Replace the revision collaborator.
    pub fn with_revisions(mut self, revisions: Arc<dyn RevisionCreator>) -> Self {
        self.revisions = revisions;
        self
    }

    /// Create a deployment of `droplet` for `app`.
    ///
    /// # Errors
    ///
    /// - `DeployError::SetCurrentDroplet` if `droplet` is `None`, unknown, or
    ///   belongs to another app.
    /// - `DeployError::NoWebProcess` if the app has nothing to roll out.
    /// - Store, revision and audit failures abort the whole operation.
    pub fn create(
        &self,
        app: &AppGuid,
        droplet: Option<&DropletGuid>,
        user: &UserAuditInfo,
    ) -> Result<Deployment, DeployError> {
        let deployment = self
            .store
            .transaction(|tx| self.create_in(tx, app, droplet, user))?;

        info!(
            app = %deployment.app,
            deployment = %deployment.guid,
            revision = ?deployment.revision.as_ref().map(|r| r.version),
            "deployment created"
        );
        Ok(deployment)
    }

    fn create_in(
        &self,
        tx: &mut dyn Transaction,
        app_guid: &AppGuid,
        droplet: Option<&DropletGuid>,
        user: &UserAuditInfo,
    ) -> Result<Deployment, DeployError> {
        let mut app = tx.app(app_guid)?;
        let droplet = assignable_droplet(tx, &app, droplet)?;

        let previous_droplet = app.droplet.replace(droplet.guid.clone());
        tx.update_app(&app)?;

        let web_process = oldest_web_process(tx, &app)?;

        let in_flight: Vec<Deployment> = tx
            .deployments_for_app(&app.guid)?
            .into_iter()
            .filter(Deployment::is_deploying)
            .collect();

        // A superseding rollout keeps the instance count the first one started from.
        let original_instances = in_flight
            .last()
            .map(|d| d.original_web_process_instance_count)
            .unwrap_or(web_process.instances);

        let revision = self.revisions.create(tx, &app, &droplet)?;

        let now = Utc::now();
        let mut deployment = Deployment {
            guid: DeploymentGuid::generate(),
            app: app.guid.clone(),
            droplet: Some(droplet.guid.clone()),
            previous_droplet,
            state: DeploymentState::Deploying,
            deploying_web_process: None,
            original_web_process_instance_count: original_instances,
            revision: Some(RevisionRef {
                guid: revision.guid.clone(),
                version: revision.version,
            }),
            created_at: now,
            updated_at: now,
        };

        let deploying = ProcessReplicator::replicate(&web_process, &deployment);
        deployment.deploying_web_process = Some(deploying.guid.clone());
        let deploying_guid = deploying.guid.clone();
        let deploying_label = deploying.type_label();
        tx.insert_process(deploying)?;

        RouteCarryover::carry_over(tx, &web_process.guid, &deploying_guid)?;

        for mut prior in in_flight {
            debug!(app = %app.guid, deployment = %prior.guid, "superseding in-flight deployment");
            prior.state = DeploymentState::Deployed;
            prior.updated_at = now;
            tx.update_deployment(&prior)?;
        }

        tx.insert_deployment(deployment.clone())?;
        tx.insert_historical_related_process(HistoricalRelatedProcess {
            deployment: deployment.guid.clone(),
            process_guid: deploying_guid,
            process_type: deploying_label,
            created_at: now,
        })?;

        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "droplet_guid".to_string(),
            serde_json::Value::String(droplet.guid.to_string()),
        );
        metadata.insert(
            "deployment_guid".to_string(),
            serde_json::Value::String(deployment.guid.to_string()),
        );
        self.audit
            .record(AuditEvent::for_app(DEPLOYMENT_CREATE, user, &app, metadata))?;

        Ok(deployment)
    }
}

fn assignable_droplet(
    tx: &dyn Transaction,
    app: &App,
    droplet: Option<&DropletGuid>,
) -> Result<Droplet, DeployError> {
    let Some(guid) = droplet else {
        return Err(DeployError::SetCurrentDroplet);
    };

    match tx.droplet(guid)? {
        Some(droplet) if droplet.belongs_to(&app.guid) => Ok(droplet),
        _ => Err(DeployError::SetCurrentDroplet),
    }
}

/// The oldest process of the web type.
///
/// Several web processes can exist after repeated rollouts; the first one
/// created is the one the rollout replaces.
fn oldest_web_process(tx: &dyn Transaction, app: &App) -> Result<Process, DeployError> {
    tx.processes_for_app(&app.guid)?
        .into_iter()
        .find(|p| p.process_type.is_web())
        .ok_or_else(|| DeployError::NoWebProcess(app.guid.to_string()))
}
