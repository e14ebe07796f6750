// ABOUTME: Clones a web process into the deploying process of a rollout.
// ABOUTME: Copies runtime characteristics but never the instance count.

use chrono::Utc;

use crate::model::{Deployment, Process, ProcessState};
use crate::types::{ProcessGuid, ProcessType};

/// Builds deploying processes from the process they replace.
pub struct ProcessReplicator;

impl ProcessReplicator {
    /// Clone `source` into a started deploying-web process bound to `deployment`.
    ///
    /// The new process starts at a single instance; the rollout controller
    /// scales it independently of `source`.
    pub fn replicate(source: &Process, deployment: &Deployment) -> Process {
        let now = Utc::now();
        Process {
            guid: ProcessGuid::generate(),
            app: source.app.clone(),
            process_type: ProcessType::DeployingWeb,
            state: ProcessState::Started,
            instances: 1,
            memory_mb: source.memory_mb,
            disk_quota_mb: source.disk_quota_mb,
            file_descriptors: source.file_descriptors,
            command: source.command.clone(),
            detected_buildpack: source.detected_buildpack.clone(),
            health_check: source.health_check.clone(),
            enable_ssh: source.enable_ssh,
            ports: source.ports.clone(),
            metadata: source.metadata.clone(),
            revision: deployment.revision.as_ref().map(|r| r.guid.clone()),
            deployment: Some(deployment.guid.clone()),
            created_at: now,
            updated_at: now,
        }
    }
}
