// ABOUTME: Revision creation collaborator invoked once per deployment.
// ABOUTME: The default creator numbers revisions per app starting at 1.

use chrono::Utc;

use crate::model::{App, Droplet, Revision};
use crate::store::Transaction;
use crate::types::RevisionGuid;

use super::DeployError;

/// Creates the revision a new deployment rolls out.
pub trait RevisionCreator: Send + Sync {
    fn create(
        &self,
        tx: &mut dyn Transaction,
        app: &App,
        droplet: &Droplet,
    ) -> Result<Revision, DeployError>;
}

/// Stores a new revision whose version follows the app's latest one.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialRevisions;

impl RevisionCreator for SequentialRevisions {
    fn create(
        &self,
        tx: &mut dyn Transaction,
        app: &App,
        droplet: &Droplet,
    ) -> Result<Revision, DeployError> {
        let latest = tx
            .revisions_for_app(&app.guid)?
            .iter()
            .map(|r| r.version)
            .max()
            .unwrap_or(0);

        let revision = Revision {
            guid: RevisionGuid::generate(),
            app: app.guid.clone(),
            version: latest + 1,
            droplet: droplet.guid.clone(),
            created_at: Utc::now(),
        };
        tx.insert_revision(revision.clone())?;
        Ok(revision)
    }
}
